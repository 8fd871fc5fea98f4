//! Keygen command implementation.

use anyhow::Result;
use inspector_config::Encryptor;

use super::OutputTarget;

pub fn run(target: &OutputTarget) -> Result<()> {
    let key = Encryptor::generate_key();
    let output = target.formatter().format_key(&key)?;
    target.emit(&output)
}
