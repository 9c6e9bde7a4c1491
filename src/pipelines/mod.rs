mod build;
mod common;
mod files;
mod invoke;
mod package;

pub use build::{execute_build_pipeline, promote_export, BuildParams, BUILD_PLAYER_METHOD};
pub use common::{unity_executable, unity_executable_in};
pub use files::{execute_copy_pipeline, execute_delete_pipeline};
pub use invoke::{execute_invoke_pipeline, parse_chain};
pub use package::{execute_android_pipeline, execute_ios_pipeline, execute_package_pipeline};
