/// Floating-point tolerance for the round-trip identity of
/// `matrix2para(para2matrix(p))` (spec invariant: `1e-8`).
pub const EPS: f64 = 1e-8;
