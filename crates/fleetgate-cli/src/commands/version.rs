//! Version command.

use crate::style::print_info_table;

pub fn run() {
    print_info_table(&[
        ("fleetgate", env!("CARGO_PKG_VERSION")),
        ("rust edition", "2024"),
        ("config file", "fleetgate.toml"),
    ]);
}
