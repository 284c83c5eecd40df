//! Element types used for the matmul operands.

use serde::{Deserialize, Serialize};

/// Element type of the operand and result matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatmulDtype {
    /// IEEE half precision.
    #[default]
    F16,
    /// bfloat16.
    Bf16,
    /// IEEE single precision.
    F32,
}

impl MatmulDtype {
    /// Bytes per element.
    pub const fn byte_width(self) -> u64 {
        match self {
            Self::F16 | Self::Bf16 => 2,
            Self::F32 => 4,
        }
    }

    /// Name used in benchmark reports (`"float16"` etc.).
    pub const fn report_label(self) -> &'static str {
        match self {
            Self::F16 => "float16",
            Self::Bf16 => "bfloat16",
            Self::F32 => "float32",
        }
    }
}

impl std::fmt::Display for MatmulDtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::F16 => write!(f, "f16"),
            Self::Bf16 => write!(f, "bf16"),
            Self::F32 => write!(f, "f32"),
        }
    }
}

impl std::str::FromStr for MatmulDtype {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "f16" | "fp16" | "float16" | "half" => Ok(Self::F16),
            "bf16" | "bfloat16" => Ok(Self::Bf16),
            "f32" | "fp32" | "float32" | "float" => Ok(Self::F32),
            other => Err(format!("unknown matmul dtype: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [MatmulDtype; 3] = [MatmulDtype::F16, MatmulDtype::Bf16, MatmulDtype::F32];

    proptest! {
        #[test]
        fn display_parses_back_in_any_case(
            dtype in prop::sample::select(ALL.to_vec()),
            upper in any::<bool>(),
            pad in "[ \t]{0,2}",
        ) {
            let text = dtype.to_string();
            let text = if upper { text.to_uppercase() } else { text };
            prop_assert_eq!(format!("{pad}{text}{pad}").parse::<MatmulDtype>().unwrap(), dtype);
        }
    }

    #[test]
    fn widths() {
        assert_eq!(MatmulDtype::F16.byte_width(), 2);
        assert_eq!(MatmulDtype::Bf16.byte_width(), 2);
        assert_eq!(MatmulDtype::F32.byte_width(), 4);
    }

    #[test]
    fn default_is_half() {
        assert_eq!(MatmulDtype::default(), MatmulDtype::F16);
        assert_eq!(MatmulDtype::default().report_label(), "float16");
    }

    #[test]
    fn parse_aliases() {
        assert_eq!("FP16".parse::<MatmulDtype>().unwrap(), MatmulDtype::F16);
        assert_eq!("bfloat16".parse::<MatmulDtype>().unwrap(), MatmulDtype::Bf16);
        assert_eq!(" f32 ".parse::<MatmulDtype>().unwrap(), MatmulDtype::F32);
        assert!("int8".parse::<MatmulDtype>().unwrap_err().contains("int8"));
    }

    #[test]
    fn display_parses_back() {
        for dtype in ALL {
            assert_eq!(dtype.to_string().parse::<MatmulDtype>().unwrap(), dtype);
        }
    }
}
