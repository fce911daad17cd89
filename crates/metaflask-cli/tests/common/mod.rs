//! Common test utilities for CLI testing.

use std::path::Path;

use assert_cmd::Command;
use metaflask_test_utils::CheckoutFixture;

/// A small registry: a sponsorship chain, one extension, one orphan project.
pub fn sample_checkout() -> CheckoutFixture {
    let fixture = CheckoutFixture::new();
    let armin = fixture.add_member(1, "mitsuhiko", Some("mitsuhiko"), Some("<self>"));
    fixture.add_member(2, "davidism", Some("davidism"), Some("mitsuhiko"));
    fixture.add_member(3, "untitaker", Some("untitaker"), Some("davidism"));

    fixture.write_project_file(
        "flask-sqlalchemy",
        "META",
        "Name: Flask-SQLAlchemy\nGitHub: pallets/flask-sqlalchemy\nPyPI: Flask-SQLAlchemy\n",
    );
    fixture.write_project_file("flask-sqlalchemy", "README", "Adds SQLAlchemy support.\n");
    fixture.write_project_file("flask-sqlalchemy", "EXTENSION_STATUS", "Approved: yes\n");
    fixture.copy_into_project("flask-sqlalchemy", "STEWARDSHIP/mitsuhiko", &armin);

    fixture.write_project_file("orphan", "META", "Name: Orphan\n");
    fixture
}

/// The `metaflask` binary run from `dir`, isolated from the caller's environment.
pub fn metaflask_in(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("metaflask").expect("binary is built");
    cmd.current_dir(dir)
        .env_remove("METAFLASK_CONFIG")
        .env_remove("METAFLASK_CHECKOUT")
        .env_remove("METAFLASK_LOG_LEVEL")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// The `metaflask` binary reading `checkout`.
pub fn metaflask(checkout: &Path) -> Command {
    let mut cmd = metaflask_in(checkout);
    cmd.arg("--checkout").arg(checkout);
    cmd
}
