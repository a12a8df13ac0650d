use crate::{
    agg::AggError, archive::ArchiveError, grid::GridError, load::LoadError,
    spectrum::SpectrumError,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error in the `archive` module")]
    Archive(#[from] ArchiveError),
    #[error("Error in the `load` module")]
    Load(#[from] LoadError),
    #[error("Error in the `grid` module")]
    Grid(#[from] GridError),
    #[error("Error in the `agg` module")]
    Agg(#[from] AggError),
    #[error("Error in the `spectrum` module")]
    Spectrum(#[from] SpectrumError),
}
