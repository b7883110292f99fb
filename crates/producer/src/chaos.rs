//! Random failure injection

use contracts::{FailureInjector, Message};
use rand::Rng;

/// Value that triggers a failure when drawn
const TRIGGER: u32 = 3;

/// Fails roughly one invocation in `one_in`
///
/// `one_in == 0` disables injection.
#[derive(Debug, Clone, Copy)]
pub struct RandomFailureInjector {
    one_in: u32,
}

impl RandomFailureInjector {
    pub fn new(one_in: u32) -> Self {
        Self { one_in }
    }

    pub fn one_in(&self) -> u32 {
        self.one_in
    }
}

impl FailureInjector for RandomFailureInjector {
    fn should_fail(&self, _message: &Message) -> Option<String> {
        if self.one_in == 0 {
            return None;
        }
        let value = rand::rng().random_range(0..self.one_in);
        (value == TRIGGER % self.one_in).then(|| format!("OMG THE RANDOM VALUE IS {value}!"))
    }
}
