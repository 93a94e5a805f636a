//! Engine configuration.

/// Options controlling how doubles synthesize values and how verification
/// treats them.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Synthesize return values from declared types when no behavior is
    /// configured. When disabled, such calls fail and no nested doubles are
    /// prepared. Default: true.
    pub auto_return_values: bool,
    /// Verify expectations attached to stubs as well as mocks. Default: false.
    pub check_stub_expectations: bool,
    /// Maximum number of mismatched calls kept per report entry. Default: 3.
    pub mismatch_sample_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            auto_return_values: true,
            check_stub_expectations: false,
            mismatch_sample_limit: 3,
        }
    }
}
