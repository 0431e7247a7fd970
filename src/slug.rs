use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};

pub const SLUG_MAX_LEN: usize = 50;

/// Lowercase ASCII slug: whitespace, `-` and `_` runs collapse into one `-`,
/// anything else that is not alphanumeric is dropped.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    out
}

/// Base slug for `name`, falling back to `fallback` when nothing survives
/// slugification.
pub fn base_slug(name: &str, fallback: &str) -> String {
    let slug = slugify(name);
    let slug = if slug.is_empty() { fallback.to_string() } else { slug };
    truncate(&slug, SLUG_MAX_LEN).to_string()
}

/// The n-th collision candidate: the base, shortened so that `-{n}` still
/// fits under [`SLUG_MAX_LEN`].
pub fn numbered(base: &str, n: u32) -> String {
    let suffix = n.to_string();
    let keep = SLUG_MAX_LEN.saturating_sub(suffix.len() + 1);
    format!("{}-{}", truncate(base, keep), suffix)
}

fn truncate(s: &str, max: usize) -> &str {
    // Slugs are ASCII, so byte offsets are char boundaries.
    &s[..s.len().min(max)]
}

/// First candidate for `name` not already present in `column` of `E`.
pub async fn unique_slug<E, C>(
    db: &C,
    column: E::Column,
    name: &str,
    fallback: &str,
) -> Result<String, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let base = base_slug(name, fallback);
    let mut slug = base.clone();
    let mut n = 1;

    while E::find().filter(column.eq(slug.as_str())).one(db).await?.is_some() {
        slug = numbered(&base, n);
        n += 1;
    }

    Ok(slug)
}
