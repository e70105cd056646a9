use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagecraft_editor::config::DEFAULT_CONFIG_NAME;
use pagecraft_editor::EditorConfig;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory to write the config into (defaults to the current directory)
    pub dir: Option<PathBuf>,

    /// Prefix for generated element ids
    #[arg(short, long, default_value = "pc")]
    pub id_prefix: String,

    /// Undo levels to keep (0 = unlimited)
    #[arg(short, long)]
    pub max_undo_levels: Option<usize>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let dir = match &args.dir {
        Some(dir) => PathBuf::from(cwd).join(dir),
        None => PathBuf::from(cwd),
    };
    fs::create_dir_all(&dir)?;
    let config_path = EditorConfig::path_in(&dir);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Writing editor configuration...".bright_blue().bold());

    let mut config = EditorConfig {
        id_prefix: args.id_prefix,
        ..EditorConfig::default()
    };
    if let Some(levels) = args.max_undo_levels {
        config.max_undo_levels = levels;
    }

    let content = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, content)?;

    // read back through the same loader the editor uses
    let loaded = EditorConfig::load(&dir)?;
    tracing::debug!(?loaded, "configuration written");

    println!("{} Created {}", "✓".green(), config_path.display().to_string().bright_white());
    println!();
    println!("  id prefix:        {}", loaded.id_prefix);
    println!("  undo levels:      {}", loaded.max_undo_levels);
    println!("  checkpoint delay: {}ms", loaded.checkpoint_debounce_ms);
    println!("  paste offset:     {}px", loaded.paste_offset_px);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dir: Option<PathBuf>, force: bool) -> InitArgs {
        InitArgs {
            dir,
            id_prefix: "site".to_string(),
            max_undo_levels: Some(10),
            force,
        }
    }

    #[test]
    fn test_writes_into_given_dir() {
        let cwd = tempfile::tempdir().unwrap();
        let cwd_str = cwd.path().to_str().unwrap();

        init(args(Some(PathBuf::from("site/editor")), false), cwd_str).unwrap();

        let dir = cwd.path().join("site/editor");
        assert!(dir.join(DEFAULT_CONFIG_NAME).exists());
        assert!(!cwd.path().join(DEFAULT_CONFIG_NAME).exists());
        let config = EditorConfig::load(&dir).unwrap();
        assert_eq!(config.id_prefix, "site");
        assert_eq!(config.max_undo_levels, 10);
    }

    #[test]
    fn test_defaults_to_cwd_and_keeps_existing_without_force() {
        let cwd = tempfile::tempdir().unwrap();
        let cwd_str = cwd.path().to_str().unwrap();
        let path = cwd.path().join(DEFAULT_CONFIG_NAME);
        std::fs::write(&path, "{}").unwrap();

        init(args(None, false), cwd_str).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");

        init(args(None, true), cwd_str).unwrap();
        assert_eq!(EditorConfig::load(cwd.path()).unwrap().id_prefix, "site");
    }
}
