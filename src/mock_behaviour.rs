//! This module provides ways to tweak the in-process backends, so that they can return errors on some tests

use std::error::Error;

/// This stores some behaviour tweaks, that describe how a mocked backend will behave during a given test
///
/// So that a functions fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    // From the DocumentStore trait
    pub watch_behaviour: (u32, u32),
    pub insert_behaviour: (u32, u32),
    pub update_behaviour: (u32, u32),
    pub remove_behaviour: (u32, u32),

    // From the IdentityProvider trait
    pub sign_in_behaviour: (u32, u32),
    pub sign_out_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All items will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            watch_behaviour: (0, n_fails),
            insert_behaviour: (0, n_fails),
            update_behaviour: (0, n_fails),
            remove_behaviour: (0, n_fails),
            sign_in_behaviour: (0, n_fails),
            sign_out_behaviour: (0, n_fails),
        }
    }

    pub fn can_watch(&mut self) -> Result<(), Box<dyn Error>> {
        decrement(&mut self.watch_behaviour, "watch")
    }
    pub fn can_insert(&mut self) -> Result<(), Box<dyn Error>> {
        decrement(&mut self.insert_behaviour, "insert")
    }
    pub fn can_update(&mut self) -> Result<(), Box<dyn Error>> {
        decrement(&mut self.update_behaviour, "update")
    }
    pub fn can_remove(&mut self) -> Result<(), Box<dyn Error>> {
        decrement(&mut self.remove_behaviour, "remove")
    }
    pub fn can_sign_in(&mut self) -> Result<(), Box<dyn Error>> {
        decrement(&mut self.sign_in_behaviour, "sign_in")
    }
    pub fn can_sign_out(&mut self) -> Result<(), Box<dyn Error>> {
        decrement(&mut self.sign_out_behaviour, "sign_out")
    }
}


/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), Box<dyn Error>> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 -= 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else if remaining_failures > 0 {
        value.1 -= 1;
        log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
        Err(format!("Mocked behaviour requires this {} to fail this time. ({:?})", descr, value).into())
    } else {
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    }
}
