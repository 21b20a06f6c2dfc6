//!
//! Top level operating state
//!

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RobotState {
    /// Motors held stopped, waiting for orders
    #[default]
    Standby,
    /// Driving under remote control (or a built in routine)
    Manual,
}

#[derive(Debug, Default)]
pub struct StateMachine {
    state: RobotState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RobotState {
        self.state
    }

    /// Enter (or re-enter) standby
    pub fn enter_standby(&mut self) {
        if self.state != RobotState::Standby {
            log::info!("{:?} -> Standby", self.state);
        }
        self.state = RobotState::Standby;
    }

    /// Enter (or stay in) manual control
    pub fn enter_manual(&mut self) {
        if self.state != RobotState::Manual {
            log::info!("{:?} -> Manual", self.state);
        }
        self.state = RobotState::Manual;
    }
}
