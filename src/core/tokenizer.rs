//! Token estimation for concatenated reports
//!
//! Uses tiktoken encodings when available and a cheap character heuristic
//! otherwise. The count is informational: it tells the caller roughly how
//! much of a model context window the report will take.

use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;
use tiktoken_rs::{cl100k_base, o200k_base, CoreBPE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenModel {
    /// cl100k_base (GPT-4 family, reasonable approximation for others)
    #[default]
    Cl100k,
    /// o200k_base (GPT-4o family)
    O200k,
    /// Character heuristic, no encoding tables
    Heuristic,
}

static CL100K_BPE: Lazy<Option<CoreBPE>> = Lazy::new(|| cl100k_base().ok());

static O200K_BPE: Lazy<Option<CoreBPE>> = Lazy::new(|| o200k_base().ok());

impl TokenModel {
    fn bpe(&self) -> Option<&'static CoreBPE> {
        match self {
            TokenModel::Cl100k => CL100K_BPE.as_ref(),
            TokenModel::O200k => O200K_BPE.as_ref(),
            TokenModel::Heuristic => None,
        }
    }
}

impl fmt::Display for TokenModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenModel::Cl100k => "cl100k",
            TokenModel::O200k => "o200k",
            TokenModel::Heuristic => "heuristic",
        };
        f.write_str(name)
    }
}

impl FromStr for TokenModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k" | "cl100k_base" | "gpt4" | "gpt-4" | "default" => Ok(TokenModel::Cl100k),
            "o200k" | "o200k_base" | "gpt4o" | "gpt-4o" => Ok(TokenModel::O200k),
            "heuristic" | "fast" => Ok(TokenModel::Heuristic),
            _ => Err(format!(
                "Unknown token model: {}. Available: cl100k, o200k, heuristic",
                s
            )),
        }
    }
}

/// Count tokens, falling back to the heuristic if the encoding failed to load
pub fn count_tokens(text: &str, model: TokenModel) -> usize {
    if text.is_empty() {
        return 0;
    }

    match model.bpe() {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => estimate_tokens_heuristic(text),
    }
}

/// About four ASCII characters per token, CJK at roughly 1.5 per token,
/// other non-ASCII at two per token
pub fn estimate_tokens_heuristic(text: &str) -> usize {
    let mut ascii = 0usize;
    let mut cjk = 0usize;
    let mut other = 0usize;

    for c in text.chars() {
        if c.is_ascii() {
            ascii += 1;
        } else if is_cjk_char(c) {
            cjk += 1;
        } else {
            other += 1;
        }
    }

    ascii.div_ceil(4) + (cjk * 2).div_ceil(3) + other.div_ceil(2)
}

#[inline]
fn is_cjk_char(c: char) -> bool {
    let cp = c as u32;
    (0x4E00..=0x9FFF).contains(&cp)
        || (0x3400..=0x4DBF).contains(&cp)
        || (0x3040..=0x30FF).contains(&cp)
        || (0xAC00..=0xD7AF).contains(&cp)
}
