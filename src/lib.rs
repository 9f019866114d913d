// Copyright 2024 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Junction-anchored local assembly for structural variant breakpoints.
//!
//! Reads supporting a candidate breakpoint (a [`Junction`]) are assembled into a consensus
//! sequence ([`JunctionAssembly`]), split into distinct haplotypes when their disagreement is
//! systematic, extended into the reference, annotated with repeats and remote regions, and
//! finally linked and phased into [`PhaseGroup`]s and [`PhaseSet`]s.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate derive_builder;
#[macro_use]
extern crate getset;
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate strum_macros;

pub mod assembly;
pub mod config;
pub mod errors;
pub mod junction;
pub mod phasing;
pub mod pipeline;
pub mod reads;
pub mod remote;
pub mod utils;

pub use crate::assembly::{
    AssemblyOutcome, AssemblySequence, AssemblySupport, JunctionAssembler, JunctionAssembly,
    SupportType,
};
pub use crate::config::AssemblyConfig;
pub use crate::errors::Error;
pub use crate::junction::{Junction, JunctionGroup, Orientation};
pub use crate::phasing::{AssemblyLink, LinkType, PhaseGroup, PhaseSet, SvType};
pub use crate::reads::Read;
pub use crate::remote::RemoteRegion;
pub use crate::utils::repeats::RepeatInfo;
