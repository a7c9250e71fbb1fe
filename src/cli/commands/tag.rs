//! Tag command handlers

use crate::config::Config;
use crate::db::Store;
use crate::models::NewTag;

pub async fn cmd_tag_add(
    config: &Config,
    name: &str,
    color: &str,
    slug: &str,
) -> anyhow::Result<()> {
    let tag = match NewTag::parse(name, color, slug) {
        Ok(tag) => tag,
        Err(errors) => {
            println!("Invalid tag: {errors}");
            return Ok(());
        }
    };

    let store = Store::new(&config.general.database_path).await?;

    match store.create_tag(&tag.name, &tag.color, &tag.slug).await? {
        Some(created) => {
            println!("✓ Added tag #{}", created.id);
            println!(
                "  Name: {} | Color: {} | Slug: {}",
                created.name, created.color, created.slug
            );
        }
        None => {
            println!(
                "A tag named '{}' or with slug '{}' already exists.",
                tag.name, tag.slug
            );
        }
    }

    Ok(())
}

pub async fn cmd_tag_list(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let tags = store.list_tags().await?;

    if tags.is_empty() {
        println!("No tags defined.");
        println!();
        println!("Add tags with: foodgram tag add <name> <color> <slug>");
        return Ok(());
    }

    println!("Tags ({} total)", tags.len());
    println!("{:-<50}", "");

    for tag in tags {
        println!("{:>4}  {:<20} {:<8} {}", tag.id, tag.name, tag.color, tag.slug);
    }

    Ok(())
}
