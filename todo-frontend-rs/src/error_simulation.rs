use std::cell::Cell;
use std::rc::Rc;

/// When enabled, every mutating request asks the server to fail. Clones share the same switch.
#[derive(Clone, Debug, Default)]
pub struct ErrorSimulation(Rc<Cell<bool>>);

impl ErrorSimulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.0.get()
    }

    pub fn set(&self, enabled: bool) {
        if self.0.replace(enabled) != enabled {
            log::info!(
                "Error simulation {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
    }

    pub fn enable(&self) {
        self.set(true);
    }

    pub fn disable(&self) {
        self.set(false);
    }

    pub fn toggle(&self) -> bool {
        let enabled = !self.is_enabled();
        self.set(enabled);
        enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_switch() {
        let simulation = ErrorSimulation::new();
        let handle = simulation.clone();
        assert!(!handle.is_enabled());

        simulation.enable();
        assert!(handle.is_enabled());
        assert!(!handle.toggle());
        assert!(!simulation.is_enabled());
    }
}
