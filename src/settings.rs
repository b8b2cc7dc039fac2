/// How rows are filtered before compression. Default: `ADAPTIVE`
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum FilterStrategy {
    /// every filter at zero
    ZERO = 0,
    SUB,
    UP,
    AVG,
    PAETH,
    /// Pick the filter per row with the minimum-sum heuristic
    ADAPTIVE,
}

impl FilterStrategy {
    pub(crate) fn to_png(self) -> (png::FilterType, png::AdaptiveFilterType) {
        use png::AdaptiveFilterType::*;
        use png::FilterType::*;
        match self {
            FilterStrategy::ZERO => (NoFilter, NonAdaptive),
            FilterStrategy::SUB => (Sub, NonAdaptive),
            FilterStrategy::UP => (Up, NonAdaptive),
            FilterStrategy::AVG => (Avg, NonAdaptive),
            FilterStrategy::PAETH => (Paeth, NonAdaptive),
            FilterStrategy::ADAPTIVE => (Sub, Adaptive),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DecoderSettings {
    /// Upper bound on memory the codec may allocate for one image, in bytes
    pub max_alloc: usize,
}

impl DecoderSettings {
    pub fn new() -> Self {
        Self {
            max_alloc: 64 * 1024 * 1024,
        }
    }

    pub(crate) fn limits(&self) -> png::Limits {
        let mut limits = png::Limits::default();
        limits.bytes = self.max_alloc;
        limits
    }
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct EncoderSettings {
    level: u8,
    pub filter_strategy: FilterStrategy,
}

impl EncoderSettings {
    pub fn new() -> Self {
        Self {
            level: 6,
            filter_strategy: FilterStrategy::ADAPTIVE,
        }
    }

    /// 0 (fastest) to 9 (best). Values above 9 are clamped.
    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(9);
    }

    /// zlib compression level
    pub fn level(&self) -> u8 {
        self.level
    }

    pub(crate) fn compression(&self) -> png::Compression {
        match self.level {
            0..=3 => png::Compression::Fast,
            4..=7 => png::Compression::Default,
            _ => png::Compression::Best,
        }
    }
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn level() {
    let mut s = EncoderSettings::new();
    assert_eq!(6, s.level());
    assert_eq!(png::Compression::Default, s.compression());
    s.set_level(0);
    assert_eq!(png::Compression::Fast, s.compression());
    s.set_level(200);
    assert_eq!(9, s.level());
    assert_eq!(png::Compression::Best, s.compression());
}
