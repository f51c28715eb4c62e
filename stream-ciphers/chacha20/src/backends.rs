// copyright 2019 Kaz Wesley

//! Interchangeable keystream block generators.
//!
//! Safe creation of a [`Backend`] goes only through feature detection, so a handle for an
//! accelerated implementation proves the running CPU supports it.

use cfg_if::cfg_if;
use core::fmt;

use crate::error::Result;
use crate::state::State;
use crate::BLOCK_SIZE;

mod soft;

cfg_if! {
    if #[cfg(all(
        feature = "std",
        target_arch = "x86_64",
        target_feature = "sse2",
        not(feature = "no_simd"),
        not(miri)
    ))] {
        mod simd;
        use self::simd::Isa;
    } else {
        /// No accelerated implementations in this build.
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        enum Isa {}

        impl Isa {
            const ALL: [Isa; 0] = [];

            fn name(self) -> &'static str {
                match self {}
            }

            fn is_detected(self) -> bool {
                match self {}
            }

            unsafe fn generate(self, _: &mut State, _: &mut [u8]) {
                match self {}
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Soft,
    Simd(Isa),
}

/// A ChaCha20 block function implementation.
///
/// Every backend produces byte-identical output for the same state; they differ only in
/// speed. The registry order is fixed: `soft` first, then accelerated implementations
/// from least to most capable.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Backend(Kind);

impl Backend {
    /// The portable implementation, always available.
    pub const fn portable() -> Self {
        Backend(Kind::Soft)
    }

    /// Stable identifier of this implementation.
    pub fn name(self) -> &'static str {
        match self.0 {
            Kind::Soft => "soft",
            Kind::Simd(isa) => isa.name(),
        }
    }

    /// Every implementation the running CPU supports, in registry order.
    pub fn available() -> impl Iterator<Item = Backend> {
        core::iter::once(Kind::Soft)
            .chain(
                Isa::ALL
                    .into_iter()
                    .filter(|isa| isa.is_detected())
                    .map(Kind::Simd),
            )
            .map(Backend)
    }

    /// Look up an available implementation by [`name`](Backend::name).
    pub fn by_name(name: &str) -> Option<Self> {
        Self::available().find(|b| b.name() == name)
    }

    /// Probe the CPU and pick the most capable implementation.
    pub fn detect() -> Self {
        let best = Self::available().last().unwrap_or(Self::portable());
        tracing::debug!(backend = best.name(), "detected chacha20 backend");
        best
    }

    /// The process-wide default, chosen by [`detect`](Backend::detect) on first use and
    /// fixed thereafter. Use [`ChaCha20::with_backend`](crate::ChaCha20::with_backend) to
    /// run a particular implementation instead.
    pub fn active() -> Self {
        cfg_if! {
            if #[cfg(feature = "std")] {
                static ACTIVE: std::sync::OnceLock<Backend> = std::sync::OnceLock::new();
                *ACTIVE.get_or_init(Self::detect)
            } else {
                Self::detect()
            }
        }
    }

    /// Fill `out` with consecutive keystream blocks starting at the state's counter, and
    /// advance the counter past them.
    ///
    /// Fails with [`Error::CounterOverflow`](crate::Error::CounterOverflow), leaving `out`
    /// and `state` untouched, if the counter cannot advance that far.
    ///
    /// # Panics
    ///
    /// If `out.len()` is not a multiple of [`BLOCK_SIZE`].
    pub fn generate(self, state: &mut State, out: &mut [u8]) -> Result<()> {
        assert_eq!(out.len() % BLOCK_SIZE, 0, "output must be whole blocks");
        state.reserve((out.len() / BLOCK_SIZE) as u64)?;
        match self.0 {
            Kind::Soft => soft::generate(state, out),
            // SAFETY: a `Kind::Simd` is only constructed in `available` after the CPU
            // feature it needs has been detected.
            Kind::Simd(isa) => unsafe { isa.generate(state, out) },
        }
        Ok(())
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::active()
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Backend").field(&self.name()).finish()
    }
}
