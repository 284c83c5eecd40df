//! Scripted [`MatmulBackend`] for exercising the drivers without a device.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::time::Duration;

use gemmcheck_common::MatmulDtype;
use gemmcheck_core::{DeviceInfo, EnvironmentInfo, MatmulBackend, SampleError};

/// Calls observed by the stub, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Allocate(usize),
    Multiply(usize),
    Synchronize,
    Release(usize),
}

pub struct StubOperands {
    dimension: usize,
}

pub struct StubBackend {
    info: DeviceInfo,
    /// Sizes at or above this fail to allocate.
    pub fail_allocation_from: Option<usize>,
    /// Multiply call indices (0-based, across the backend's lifetime) that fail.
    pub failing_multiplies: Box<dyn Fn(usize) -> bool>,
    pub multiply_delay: Duration,
    pub fail_release: bool,
    multiplies: Cell<usize>,
    calls: RefCell<Vec<Call>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            info: DeviceInfo {
                name: "Stub GPU".to_string(),
                count: 2,
                ordinal: 0,
            },
            fail_allocation_from: None,
            failing_multiplies: Box::new(|_| false),
            multiply_delay: Duration::ZERO,
            fail_release: false,
            multiplies: Cell::new(0),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing_allocation_from(mut self, size: usize) -> Self {
        self.fail_allocation_from = Some(size);
        self
    }

    pub fn failing_multiplies(mut self, f: impl Fn(usize) -> bool + 'static) -> Self {
        self.failing_multiplies = Box::new(f);
        self
    }

    pub fn with_multiply_delay(mut self, delay: Duration) -> Self {
        self.multiply_delay = delay;
        self
    }

    pub fn failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn multiply_count(&self) -> usize {
        self.multiplies.get()
    }
}

impl MatmulBackend for StubBackend {
    type Operands = StubOperands;

    fn device_info(&self) -> &DeviceInfo {
        &self.info
    }

    fn allocate(&self, dimension: usize, dtype: MatmulDtype) -> Result<StubOperands, SampleError> {
        self.calls.borrow_mut().push(Call::Allocate(dimension));
        if self.fail_allocation_from.is_some_and(|limit| dimension >= limit) {
            return Err(SampleError::Allocation {
                dimension,
                dtype,
                message: "out of memory".to_string(),
            });
        }
        Ok(StubOperands { dimension })
    }

    fn multiply(&self, operands: &mut StubOperands) -> Result<(), SampleError> {
        let index = self.multiplies.get();
        self.multiplies.set(index + 1);
        self.calls.borrow_mut().push(Call::Multiply(operands.dimension));
        if !self.multiply_delay.is_zero() {
            std::thread::sleep(self.multiply_delay);
        }
        if (self.failing_multiplies)(index) {
            return Err(SampleError::Compute("device kernel launch failed".to_string()));
        }
        Ok(())
    }

    fn synchronize(&self) -> Result<(), SampleError> {
        self.calls.borrow_mut().push(Call::Synchronize);
        Ok(())
    }

    fn release(&self, operands: StubOperands) -> Result<(), SampleError> {
        self.calls.borrow_mut().push(Call::Release(operands.dimension));
        if self.fail_release {
            return Err(SampleError::Synchronize("device lost".to_string()));
        }
        Ok(())
    }
}

pub fn environment() -> EnvironmentInfo {
    EnvironmentInfo {
        library: "candle-core".to_string(),
        library_version: "0.9".to_string(),
        rocm_version: Some("6.1.2".to_string()),
        cuda_available: true,
    }
}
