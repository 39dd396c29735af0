//! Conc-size command implementation

use anyhow::Result;

use crate::QueryArgs;
use crate::commands::{concordance, print_json};

pub fn run(args: &QueryArgs) -> Result<()> {
    let conc = concordance(args)?;
    print_json(&conc.conc_size())
}
