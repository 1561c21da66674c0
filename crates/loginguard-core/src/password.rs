//! Password rules and the strength meter shown next to the password field.

/// Minimum length for a password to satisfy the rules.
pub const MIN_LENGTH: usize = 6;
/// Length a fully compliant password needs to rate as strong.
pub const STRONG_LENGTH: usize = 8;

/// Characters that count toward the special-character rule.
pub const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

/// Which rules a password meets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Requirements {
    pub length: bool,
    pub letter: bool,
    pub number: bool,
    pub special: bool,
}

impl Requirements {
    pub fn check(password: &str) -> Self {
        Self {
            length: utf16_len(password) >= MIN_LENGTH,
            letter: password.chars().any(|c| c.is_ascii_alphabetic()),
            number: password.chars().any(|c| c.is_ascii_digit()),
            special: password.chars().any(|c| SPECIAL_CHARS.contains(c)),
        }
    }

    pub fn met_count(&self) -> usize {
        [self.length, self.letter, self.number, self.special]
            .iter()
            .filter(|met| **met)
            .count()
    }

    pub fn all_met(&self) -> bool {
        self.met_count() == 4
    }

    /// `(name, met)` in display order.
    pub fn items(&self) -> [(&'static str, bool); 4] {
        [
            ("length", self.length),
            ("letter", self.letter),
            ("number", self.number),
            ("special", self.special),
        ]
    }
}

/// Length as the browser counts it: UTF-16 code units, so a character
/// outside the BMP counts twice.
fn utf16_len(password: &str) -> usize {
    password.encode_utf16().count()
}

/// Class for one requirement row.
pub fn requirement_class(met: bool) -> &'static str {
    if met {
        "requirement met"
    } else {
        "requirement not-met"
    }
}

/// True when the password satisfies every rule.
pub fn validate_password_strength(password: &str) -> bool {
    Requirements::check(password).all_met()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Weak,
    Medium,
    Strong,
}

impl Strength {
    pub fn as_str(self) -> &'static str {
        match self {
            Strength::Weak => "weak",
            Strength::Medium => "medium",
            Strength::Strong => "strong",
        }
    }
}

/// Strength bar state: level plus bar width in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrengthMeter {
    pub strength: Strength,
    pub width_percent: u8,
}

impl StrengthMeter {
    pub fn measure(password: &str) -> Self {
        let requirements = Requirements::check(password);
        let met = requirements.met_count();
        let (strength, width_percent) =
            if met == 4 && utf16_len(password) >= STRONG_LENGTH {
                (Strength::Strong, 100)
            } else if met >= 3 {
                (Strength::Medium, 66)
            } else if met >= 2 {
                (Strength::Weak, 33)
            } else {
                (Strength::Weak, 25)
            };
        Self {
            strength,
            width_percent,
        }
    }

    pub fn css_class(&self) -> String {
        format!("strength-bar strength-{}", self.strength.as_str())
    }
}
