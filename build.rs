use anyhow::Result;
use fs_extra::{copy_items, dir::CopyOptions};
use std::{env, path::PathBuf};

/// Files the scenes request at startup. Missing ones only degrade a scene.
const SCENE_ASSETS: [&str; 3] = ["posts.json", "Skull.glb", "models.glb"];

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");
    println!("cargo:rerun-if-changed=src/pipelines/shaders");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets = manifest_dir.join("assets");
    if !assets.exists() {
        println!("cargo:warning=no assets/ directory, every scene will start empty");
        return Ok(());
    }
    for name in SCENE_ASSETS {
        if !assets.join(name).exists() {
            println!("cargo:warning=assets/{} is missing, its scene falls back to a partial view", name);
        }
    }

    // Keep a copy next to the build output for packaging the web bundle.
    let mut options = CopyOptions::new();
    options.overwrite = true;
    copy_items(&[assets], env::var("OUT_DIR")?, &options)?;
    Ok(())
}
