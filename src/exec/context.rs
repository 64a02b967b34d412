use crate::command::CommandId;
use ahash::AHashMap;
use std::time::Instant;

/// Ephemeral per-run scratch state threaded through step execution.
///
/// The variables map is reserved for future conditional/loop blocks;
/// current commands do not read it.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub current_command_id: Option<CommandId>,
    pub steps_completed: usize,
    pub started_at: Instant,
    variables: AHashMap<String, f64>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            current_command_id: None,
            steps_completed: 0,
            started_at: Instant::now(),
            variables: AHashMap::new(),
        }
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: f64) {
        self.variables.insert(name.into(), value);
    }

    pub fn variable(&self, name: &str) -> Option<f64> {
        self.variables.get(name).copied()
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn clear(&mut self) {
        self.variables.clear();
        self.current_command_id = None;
        self.steps_completed = 0;
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
