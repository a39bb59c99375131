use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::base::{Operation, Operations, Rotation, Translation};

/// A single Wyckoff position: the orbit-generating operations acting on
/// fractional coordinates, plus the subgroup of operations fixing its
/// representative point.
///
/// Multiplicity is the length of `operations`. A WP has positional freedom
/// when its first operation's rotation part is not the zero matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WyckoffPosition {
    /// Wyckoff letter, e.g. `'a'` for the position of lowest multiplicity.
    pub letter: char,
    /// Site-symmetry symbol as tabulated by the symmetry service, kept only
    /// for display; matching is done against `site_symmetry`.
    pub site_symmetry_symbol: String,
    /// Operations fixing the representative point of this WP.
    pub site_symmetry: Operations,
    /// The orbit-generating operations; `operations.len()` is the multiplicity.
    pub operations: Operations,
}

impl WyckoffPosition {
    pub fn new(
        letter: char,
        site_symmetry_symbol: impl Into<String>,
        site_symmetry: Operations,
        operations: Operations,
    ) -> Self {
        Self {
            letter,
            site_symmetry_symbol: site_symmetry_symbol.into(),
            site_symmetry,
            operations,
        }
    }

    /// Build a Wyckoff position from shorthand coordinate strings such as
    /// `"x,x-y+1/4,z+1/4"`, one per orbit member.
    pub fn from_coordinates(
        letter: char,
        site_symmetry_symbol: impl Into<String>,
        site_symmetry: Operations,
        coordinate_list: &[&str],
    ) -> Self {
        let operations = coordinate_list
            .iter()
            .map(|coords| parse_operation(coords))
            .collect();
        Self::new(letter, site_symmetry_symbol, site_symmetry, operations)
    }

    pub fn multiplicity(&self) -> usize {
        self.operations.len()
    }

    /// A WP has positional freedom when its generating operation is not a
    /// fixed point.
    pub fn has_freedom(&self) -> bool {
        self.operations
            .first()
            .map(|op| op.has_freedom())
            .unwrap_or(false)
    }

    /// Expand a free parameter point into the full orbit, uncanonicalized.
    pub fn orbit(&self, point: &Vector3<f64>) -> Vec<Vector3<f64>> {
        self.operations.iter().map(|op| op.apply(point)).collect()
    }
}

/// Group Wyckoff positions by multiplicity, largest first, matching the
/// `wyckoffs_organized` contract of the symmetry service.
pub fn organize_by_multiplicity(wyckoffs: &[WyckoffPosition]) -> Vec<&WyckoffPosition> {
    let mut sorted: Vec<&WyckoffPosition> = wyckoffs.iter().collect();
    sorted.sort_by(|a, b| b.multiplicity().cmp(&a.multiplicity()));
    sorted
}

/// Parse a single Wyckoff coordinate shorthand (e.g. `"-y,x,z+1/2"`) into an
/// affine `Operation`.
///
/// EBNF (whitespace is always ignored):
/// ```text
/// <shorthand>   ::= <term>, <term>, <term>
/// <term>        ::= "-"?<factor> ([+-]<factor>)* ([+-]<translation>)?
/// <factor>      ::= <integer>? <variable>
/// <variable>    ::= "x" | "y" | "z"
/// <translation> ::= <integer> ("/" <integer>)?
/// <integer>     ::= digit+
/// ```
pub fn parse_operation(coordinates: &str) -> Operation {
    let coordinates = coordinates.replace(' ', "");
    let terms = coordinates.split(',').collect::<Vec<_>>();
    assert_eq!(terms.len(), 3, "Wyckoff shorthand must have 3 comma-separated terms");

    let mut rotation = Rotation::zeros();
    let mut translation = Translation::zeros();
    let variables = ['x', 'y', 'z'];

    for (i, term) in terms.iter().enumerate() {
        let mut tokens_with_sign: Vec<(i32, String)> = vec![];
        let mut sign = 1;
        let mut token = String::new();
        for c in term.chars() {
            if c == '+' {
                assert!(!token.is_empty());
                tokens_with_sign.push((sign, token.clone()));
                sign = 1;
                token.clear();
            } else if c == '-' {
                if !token.is_empty() {
                    tokens_with_sign.push((sign, token.clone()));
                    token.clear();
                }
                sign = -1;
            } else {
                token.push(c);
            }
        }
        if !token.is_empty() {
            tokens_with_sign.push((sign, token));
        }

        for (sign, token) in tokens_with_sign {
            if token.chars().last().unwrap().is_ascii_digit() {
                let nums = token.split('/').collect::<Vec<_>>();
                if nums.len() == 1 {
                    translation[i] += (sign as f64) * token.parse::<f64>().unwrap();
                } else {
                    let numerator = nums[0].parse::<f64>().unwrap();
                    let denominator = nums[1].parse::<f64>().unwrap();
                    translation[i] += (sign as f64) * numerator / denominator;
                }
            } else {
                for (j, &variable) in variables.iter().enumerate() {
                    if token.chars().last().unwrap() != variable {
                        continue;
                    }
                    let coeff = if token.chars().count() - 1 == 0 {
                        1
                    } else {
                        token[..token.len() - 1].parse::<i32>().unwrap()
                    };
                    rotation[(i, j)] += sign * coeff;
                }
            }
        }
    }

    Operation::new(rotation, translation)
}
