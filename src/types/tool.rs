use anyhow::Result;

/// A locally executable function the model can ask for by name.
///
/// Implementors are the decoded input of the call; `apply` runs it.
pub trait Tool {
    fn apply(&self) -> Result<String>;
}
