pub mod blast;
pub mod oncokb;

pub use blast::{
    BLAST_INTEGRATION, BlastFetcher, BlastInterpreter, BlastQueryBuilder, BlastQueryParameters,
};
pub use oncokb::{
    ONCOKB_INTEGRATION, OncoKbFetcher, OncoKbInterpreter, OncoKbQueryBuilder,
    OncoKbQueryParameters,
};
