use std::io::{self, Write};

use serde::Serialize;

use crate::domain::{Category, Subcategory, TagCount, VideoResource};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_categories(categories: &[Category]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        for category in categories {
            writeln!(
                out,
                "{:<32} {:<32} {:>5} resources",
                category.name,
                category.slug,
                category.resource_count()
            )?;
        }
        Ok(())
    }

    pub fn print_category(category: &Category) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{} ({})", category.name, category.slug)?;
        writeln!(out, "{}", category.description)?;
        writeln!(out, "{} direct resources", category.videos.len())?;
        for sub in &category.subcategories {
            write_subcategory(&mut out, sub, 1)?;
        }
        Ok(())
    }

    pub fn print_resources(resources: &[VideoResource]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        for resource in resources {
            let location = match &resource.subcategory {
                Some(sub) => format!("{} / {sub}", resource.category),
                None => resource.category.clone(),
            };
            writeln!(out, "{}  [{location}]", resource.title)?;
            if !resource.url.is_empty() {
                writeln!(out, "    {}", resource.url)?;
            }
            if !resource.tags.is_empty() {
                writeln!(out, "    #{}", resource.tags.join(" #"))?;
            }
        }
        writeln!(out, "{} resources", resources.len())?;
        Ok(())
    }

    pub fn print_tags(tags: &[TagCount]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        for tag in tags {
            writeln!(out, "{:>5}  {}", tag.count, tag.tag)?;
        }
        Ok(())
    }
}

fn write_subcategory(out: &mut impl Write, sub: &Subcategory, depth: usize) -> io::Result<()> {
    writeln!(
        out,
        "{}- {} ({}) {} resources",
        "  ".repeat(depth),
        sub.name,
        sub.slug,
        sub.resource_count()
    )?;
    for nested in &sub.subcategories {
        write_subcategory(out, nested, depth + 1)?;
    }
    Ok(())
}
