use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
/// Error types produced by crystal generation.
///
/// Lower-level setbacks (a single Wyckoff-position choice that doesn't pan
/// out, one orbit merge that fails, one rejected distance check) are
/// recovered locally by the next retry iteration and never surface as a
/// `GenError`. Only exhaustion of a retry budget, or a request that can
/// never succeed, reaches the caller.
pub enum GenError {
    /// The compatibility predicate rejected the requested species counts
    /// against the group's Wyckoff multiplicities before any sampling began.
    #[error("species counts are not compatible with the group's Wyckoff positions")]
    Infeasible,
    /// The lattice sampler exhausted its attempt budget without producing a
    /// lattice that passed the acceptance predicate.
    #[error("lattice sampler exhausted its attempt budget")]
    LatticeUnsampleable,
    /// The outer (lattice) retry loop exhausted its budget without any
    /// structure attempt placing every species.
    #[error("placement driver exhausted its retry budget")]
    PlacementExhausted,
    /// A parameter 6-tuple failed realizability in `para2matrix`. Defensive:
    /// should not occur if the lattice sampler's own invariants hold.
    #[error("lattice parameters do not form a realizable cell: {reason}")]
    DomainError { reason: String },
    /// Cooperative cancellation was observed at a retry-loop boundary.
    #[error("generation was cancelled")]
    Cancelled,
    /// The symmetry or element service has no entry for the requested key.
    #[error("no tables for group {group_number} (dimension {dim})")]
    UnknownGroup { dim: String, group_number: u16 },
    /// The element service has no entry for the given chemical symbol.
    #[error("unknown chemical species {symbol}")]
    UnknownSpecies { symbol: String },
    /// The species and per-species count vectors passed to generation differ
    /// in length.
    #[error("species list has {species_len} entries but counts has {counts_len}")]
    MismatchedSpeciesCounts {
        species_len: usize,
        counts_len: usize,
    },
    /// Generation was asked to place zero species.
    #[error("species list is empty")]
    EmptySpeciesList,
}
