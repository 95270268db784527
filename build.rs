use vergen::{BuildBuilder, Emitter, RustcBuilder};
use vergen_git2::Git2Builder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = BuildBuilder::default().build_date(true).build()?;
    let rustc = RustcBuilder::default().semver(true).build()?;

    // Source tarballs have no repository; fall back to placeholders so `--version` still works.
    let git2_result = Git2Builder::default()
        .describe(true, true, None)
        .sha(true)
        .build();

    let mut emitter = Emitter::default();
    emitter.add_instructions(&build)?.add_instructions(&rustc)?;

    if let Ok(git2) = git2_result {
        emitter.add_instructions(&git2)?;
    } else {
        println!("cargo:rustc-env=VERGEN_GIT_DESCRIBE=unknown");
        println!("cargo:rustc-env=VERGEN_GIT_SHA=unknown");
    }

    emitter.emit()?;
    Ok(())
}
