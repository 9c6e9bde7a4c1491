use anyhow::{Context, Result};
use colored::*;
use std::path::Path;
use std::time::Instant;

use crate::config::Settings;
use crate::invoker::chain::NEXT_CALL_TOKEN;
use crate::invoker::{CallChain, MethodCall, ProcessRunner};

use super::common::{invoke_chain, require_project, unity_executable};

/// Tokens separating chained calls on the command line.
const NEXT_TOKENS: [&str; 2] = [NEXT_CALL_TOKEN, "--next"];

/// Splits `method args... [-next method args...]*` into a call chain.
pub fn parse_chain(method: &str, tokens: &[String]) -> Result<CallChain> {
    let mut calls = vec![MethodCall::new(method, Vec::<String>::new())];
    let mut rest = tokens.iter();

    while let Some(token) = rest.next() {
        if NEXT_TOKENS.contains(&token.as_str()) {
            let name = rest
                .next()
                .filter(|t| !NEXT_TOKENS.contains(&t.as_str()))
                .with_context(|| format!("Missing method name after {token}"))?;
            calls.push(MethodCall::new(name.as_str(), Vec::<String>::new()));
        } else if let Some(last) = calls.last_mut() {
            last.args.push(token.clone());
        }
    }

    Ok(CallChain::from_calls(calls)?)
}

/// Execute method invocation pipeline
pub fn execute_invoke_pipeline(
    settings: &Settings,
    runner: &dyn ProcessRunner,
    project: &Path,
    method: &str,
    tokens: &[String],
) -> Result<()> {
    let start_time = Instant::now();
    let chain = parse_chain(method, tokens)?;
    let project = require_project(project)?;
    let unity = unity_executable(settings)?;

    println!(
        "{} Invoking {} method(s) in {}",
        "[INFO]".cyan(),
        chain.calls().len(),
        project.display()
    );

    invoke_chain(settings, runner, unity, project, chain).context("Unity invocation failed")?;

    println!(
        "{} Invocation completed in {:.2}s",
        "[DONE]".green().bold(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}
