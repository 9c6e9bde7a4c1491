use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::{tempdir, TempDir};
use unity_buildutil::config::Settings;
use unity_buildutil::invoker::inject::{HELPER_ROOT, HELPER_SCRIPTS};
use unity_buildutil::invoker::{CapturedOutput, CommandLine, ProcessRunner};
use unity_buildutil::pipelines::{self, BuildParams};
use unity_buildutil::{exit_code_of, BuildError};

/// Stands in for the editor: records each command and runs a side effect.
struct ScriptedEditor {
    exit_code: i32,
    effect: Box<dyn Fn(&CommandLine)>,
    calls: RefCell<Vec<CommandLine>>,
}

impl ScriptedEditor {
    fn new(exit_code: i32, effect: impl Fn(&CommandLine) + 'static) -> Self {
        Self {
            exit_code,
            effect: Box::new(effect),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn succeeding() -> Self {
        Self::new(0, |_: &CommandLine| {})
    }

    fn last_args(&self) -> Vec<String> {
        self.calls
            .borrow()
            .last()
            .map(CommandLine::args_lossy)
            .unwrap_or_default()
    }
}

impl ProcessRunner for ScriptedEditor {
    fn run(&self, cmd: &CommandLine) -> io::Result<i32> {
        self.calls.borrow_mut().push(cmd.clone());
        (self.effect)(cmd);
        Ok(self.exit_code)
    }

    fn capture(&self, cmd: &CommandLine) -> io::Result<CapturedOutput> {
        Ok(CapturedOutput {
            exit_code: self.run(cmd)?,
            stdout: Vec::new(),
        })
    }
}

struct Workspace {
    tmp: TempDir,
    project: PathBuf,
    settings: Settings,
}

impl Workspace {
    fn new() -> Self {
        let tmp = tempdir().unwrap();
        let root = tmp.path();

        let unity_home = root.join("Unity");
        let exe = pipelines::unity_executable_in(&unity_home);
        fs::create_dir_all(exe.parent().unwrap()).unwrap();
        fs::write(&exe, "").unwrap();

        let scripts_dir = root.join("EditorScripts");
        fs::create_dir_all(&scripts_dir).unwrap();
        for name in HELPER_SCRIPTS {
            fs::write(scripts_dir.join(name), "// helper").unwrap();
        }

        let project = root.join("P");
        fs::create_dir_all(project.join("Assets")).unwrap();

        let settings = Settings {
            unity_home: Some(unity_home),
            unity_log: None,
            switch_target: None,
            batch_mode: true,
            quit: true,
            scripts_dir,
            dispatcher: "Invoker.Invoke".into(),
            gradle_home: root.join("gradlew"),
        };

        Self {
            tmp,
            project,
            settings,
        }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.tmp.path().join(rel)
    }

    fn params(&self, target: &str, output: &Path, export_only: bool) -> BuildParams {
        BuildParams {
            project: self.project.clone(),
            target: target.into(),
            output: output.to_path_buf(),
            export_only,
            ..BuildParams::default()
        }
    }
}

/// Build-player arguments: (output, target, options).
fn build_player_args(args: &[String]) -> (&str, &str, &str) {
    let at = args
        .iter()
        .position(|a| a == pipelines::BUILD_PLAYER_METHOD)
        .expect("build-player call");
    (args[at + 1].as_str(), args[at + 2].as_str(), args[at + 3].as_str())
}

#[test]
fn android_export_keeps_path_without_extension() {
    let ws = Workspace::new();
    let editor = ScriptedEditor::succeeding();
    let out = ws.path("out");

    let corrected =
        pipelines::execute_build_pipeline(&ws.settings, &editor, &ws.params("android", &out, true)).unwrap();
    assert_eq!(corrected, out);

    let args = editor.last_args();
    let (path, target, options) = build_player_args(&args);
    assert_eq!(path, out.display().to_string());
    assert_eq!(target, "Android");
    assert_eq!(options, "None|AcceptExternalModificationsToPlayer");
}

#[test]
fn android_binary_build_gets_apk_extension() {
    let ws = Workspace::new();
    let editor = ScriptedEditor::succeeding();

    let corrected = pipelines::execute_build_pipeline(
        &ws.settings,
        &editor,
        &ws.params("android", &ws.path("out"), false),
    )
    .unwrap();
    assert_eq!(corrected, ws.path("out.apk"));
}

#[test]
fn parent_component_output_never_removes_the_parent() {
    let ws = Workspace::new();
    fs::create_dir_all(ws.path("builds/android")).unwrap();
    fs::write(ws.path("builds/keep.txt"), "keep").unwrap();
    let editor = ScriptedEditor::succeeding();

    let corrected = pipelines::execute_build_pipeline(
        &ws.settings,
        &editor,
        &ws.params("android", &ws.path("builds/android/.."), false),
    )
    .unwrap();
    assert_eq!(corrected, ws.path("builds.apk"));
    assert!(ws.path("builds/keep.txt").is_file());
    assert!(ws.path("builds/android").is_dir());
}

#[test]
fn win64_build_clears_previous_output() {
    let ws = Workspace::new();
    fs::create_dir_all(ws.path("out")).unwrap();
    fs::write(ws.path("out/bin.exe"), "old").unwrap();
    fs::create_dir_all(ws.path("out_Data")).unwrap();

    let exe = ws.path("out/bin.exe");
    let data = ws.path("out_Data");
    let stale_exe = exe.clone();
    let stale_data = data.clone();
    let editor = ScriptedEditor::new(0, move |_: &CommandLine| {
        assert!(!stale_exe.exists());
        assert!(!stale_data.exists());
    });

    let corrected =
        pipelines::execute_build_pipeline(&ws.settings, &editor, &ws.params("win64", &ws.path("out"), false))
            .unwrap();
    assert_eq!(corrected, exe);
    assert_eq!(editor.calls.borrow().len(), 1);
}

#[test]
fn android_export_is_flattened_after_success() {
    let ws = Workspace::new();
    let out = ws.path("out");
    let nested = out.join("MyApp");
    let effect_dir = nested.clone();
    let editor = ScriptedEditor::new(0, move |_: &CommandLine| {
        fs::create_dir_all(effect_dir.join("src")).unwrap();
        fs::write(effect_dir.join("build.gradle"), "").unwrap();
    });

    pipelines::execute_build_pipeline(&ws.settings, &editor, &ws.params("android", &out, true)).unwrap();
    assert!(out.join("build.gradle").is_file());
    assert!(out.join("src").is_dir());
    assert!(!nested.exists());
}

#[test]
fn kept_product_dir_is_not_flattened() {
    let ws = Workspace::new();
    let out = ws.path("out");
    let nested = out.join("MyApp");
    let effect_dir = nested.clone();
    let editor = ScriptedEditor::new(0, move |_: &CommandLine| {
        fs::create_dir_all(&effect_dir).unwrap();
    });

    let params = BuildParams {
        keep_product_dir: true,
        ..ws.params("android", &out, true)
    };
    pipelines::execute_build_pipeline(&ws.settings, &editor, &params).unwrap();
    assert!(nested.is_dir());
}

#[test]
fn failed_build_mirrors_exit_code_and_cleans_up() {
    let ws = Workspace::new();
    let out = ws.path("out");
    let nested = out.join("MyApp");
    let effect_dir = nested.clone();
    let editor = ScriptedEditor::new(4, move |_: &CommandLine| {
        fs::create_dir_all(&effect_dir).unwrap();
    });

    let err =
        pipelines::execute_build_pipeline(&ws.settings, &editor, &ws.params("android", &out, true)).unwrap_err();
    assert_eq!(exit_code_of(&err), 4);
    assert!(!ws.project.join(HELPER_ROOT).exists());
    // no fix-up after a failed run
    assert!(nested.is_dir());
}

#[test]
fn unknown_target_launches_nothing() {
    let ws = Workspace::new();
    let editor = ScriptedEditor::succeeding();

    let err =
        pipelines::execute_build_pipeline(&ws.settings, &editor, &ws.params("ps5", &ws.path("out"), false))
            .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::UnknownBuildTarget { .. })
    ));
    assert!(editor.calls.borrow().is_empty());
}

#[test]
fn missing_project_leaves_output_untouched() {
    let ws = Workspace::new();
    let editor = ScriptedEditor::succeeding();
    fs::write(ws.path("out.apk"), "previous").unwrap();

    let params = BuildParams {
        project: ws.path("missing"),
        ..ws.params("android", &ws.path("out"), false)
    };
    let err = pipelines::execute_build_pipeline(&ws.settings, &editor, &params).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::ProjectNotFound { .. })
    ));
    assert!(ws.path("out.apk").is_file());
}

#[test]
fn invoke_passes_chain_in_order() {
    let ws = Workspace::new();
    let editor = ScriptedEditor::succeeding();
    let tokens: Vec<String> = ["1", "-next", "B.Run", "2", "3"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    pipelines::execute_invoke_pipeline(&ws.settings, &editor, &ws.project, "A.Run", &tokens).unwrap();

    let args = editor.last_args();
    let start = args.iter().position(|a| a == "-executeMethod").unwrap();
    assert_eq!(
        &args[start..],
        ["-executeMethod", "Invoker.Invoke", "A.Run", "1", "-next", "B.Run", "2", "3"]
    );
    assert!(!ws.project.join(HELPER_ROOT).exists());
}

#[test]
fn missing_editor_is_reported_before_anything_runs() {
    let mut ws = Workspace::new();
    ws.settings.unity_home = Some(ws.path("NoUnity"));
    let editor = ScriptedEditor::succeeding();

    let err = pipelines::execute_invoke_pipeline(&ws.settings, &editor, &ws.project, "A.Run", &[]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::ToolNotFound { .. })
    ));
    assert!(editor.calls.borrow().is_empty());
}
