//! Chains of static method calls and their editor command-line form.

use crate::error::BuildError;

/// Flag that tells the editor which static method to run on startup.
pub const EXECUTE_METHOD_FLAG: &str = "-executeMethod";
/// Token separating chained calls for the in-project dispatcher.
pub const NEXT_CALL_TOKEN: &str = "-next";
/// Default dispatcher entry point shipped in the injected helper scripts.
pub const DEFAULT_DISPATCHER: &str = "Invoker.Invoke";

/// One remote static-method call: qualified name plus positional arguments.
///
/// Arguments are type-erased strings; the dispatcher coerces them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub name: String,
    pub args: Vec<String>,
}

impl MethodCall {
    pub fn new<S: Into<String>>(name: impl Into<String>, args: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Non-empty, immutable sequence of method calls.
///
/// [`CallChain::append`] consumes the chain and returns a new value, so a
/// chain handed to one invocation can be cloned and extended without the
/// two sharing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallChain {
    calls: Vec<MethodCall>,
}

impl CallChain {
    pub fn new<S: Into<String>>(method: impl Into<String>, args: impl IntoIterator<Item = S>) -> Self {
        Self {
            calls: vec![MethodCall::new(method, args)],
        }
    }

    /// Builds a chain from calls collected elsewhere (e.g. CLI input).
    pub fn from_calls(calls: Vec<MethodCall>) -> Result<Self, BuildError> {
        if calls.is_empty() {
            return Err(BuildError::EmptyChain);
        }
        Ok(Self { calls })
    }

    #[must_use]
    pub fn append<S: Into<String>>(
        mut self,
        method: impl Into<String>,
        args: impl IntoIterator<Item = S>,
    ) -> Self {
        self.calls.push(MethodCall::new(method, args));
        self
    }

    pub fn calls(&self) -> &[MethodCall] {
        &self.calls
    }

    /// Flat token sequence appended to the editor command line:
    /// `-executeMethod <dispatcher> A a1.. -next B b1..`.
    ///
    /// Tokens are passed through verbatim as separate process arguments.
    pub fn to_args(&self, dispatcher: &str) -> Vec<String> {
        let mut tokens = vec![EXECUTE_METHOD_FLAG.to_string(), dispatcher.to_string()];
        for (i, call) in self.calls.iter().enumerate() {
            if i > 0 {
                tokens.push(NEXT_CALL_TOKEN.to_string());
            }
            tokens.push(call.name.clone());
            tokens.extend(call.args.iter().cloned());
        }
        tokens
    }
}
