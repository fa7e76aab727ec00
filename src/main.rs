/*
MIT License with ATAT Attribution

Copyright (c) 2025 mcsqs-rs contributors

Interoperates with the mcsqs code from the ATAT toolkit
(Alloy Theoretic Automated Toolkit) by Axel van de Walle et al.
All rights reserved.
*/

//! Main executable for mcsqs-rs

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    mcsqs_rs::cli::run()
}
