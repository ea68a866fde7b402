use crate::admin::input::{self, LineReader};
use crate::admin::{AdminError, AdminResult};
use crate::app::AppState;
use crate::config::{Config, RegexType};
use crate::form::FormErrors;
use crate::model::group::{self, Group, NewGroup};
use crate::resource::group::{GroupInfo, by_slug};
use crate::schema;
use diesel::dsl::exists;
use diesel::prelude::*;
use tracing::info;

pub fn create_group(state: &AppState, reader: &mut dyn LineReader) -> AdminResult<()> {
    println!("Please enter the details of the new group. Enter \"done\" when finished.");
    let title = input::read("Title: ", reader)?;
    let slug = input::read("Slug: ", reader)?;
    let description = input::read("Description: ", reader)?;

    let mut conn = state.get_connection()?;
    let group = insert(&mut conn, &state.config, &title, &slug, &description)?;
    info!("Created group {} with slug {}", group.title, group.slug);
    println!("Group created.\n");
    Ok(())
}

pub fn delete_group(state: &AppState, reader: &mut dyn LineReader) -> AdminResult<()> {
    println!("Please enter the slug of the group to delete. Enter \"done\" when finished.");
    let slug = input::read("Slug: ", reader)?;

    let mut conn = state.get_connection()?;
    let group = delete(&mut conn, &slug)?;
    drop(conn);

    // Cached pages may still show the group
    state.page_cache().clear();
    info!("Deleted group {}", group.title);
    println!("Group deleted.\n");
    Ok(())
}

pub fn list_groups(state: &AppState) -> AdminResult<()> {
    let mut conn = state.get_connection()?;
    let groups = GroupInfo::all(&mut conn)?;
    if groups.is_empty() {
        println!("There are no groups.\n");
        return Ok(());
    }
    for group in groups {
        println!("  {:24} {} ({} posts)", group.slug.as_str(), group.title, group.post_count);
    }
    println!();
    Ok(())
}

/// Validates and inserts a new group.
fn insert(
    conn: &mut SqliteConnection,
    config: &Config,
    title: &str,
    slug: &str,
    description: &str,
) -> AdminResult<Group> {
    let mut errors = FormErrors::default();
    if title.is_empty() {
        errors.add("title", "Title is required");
    } else if title.chars().count() > group::MAX_TITLE_LENGTH {
        errors.add("title", format!("Title can be at most {} characters", group::MAX_TITLE_LENGTH));
    }
    if slug.len() > group::MAX_SLUG_LENGTH {
        errors.add("slug", format!("Slug can be at most {} characters", group::MAX_SLUG_LENGTH));
    } else if !config.regex(RegexType::Slug).is_match(slug) {
        errors.add("slug", "Slug may only contain letters, numbers, hyphens and underscores");
    } else {
        let taken: bool =
            diesel::select(exists(schema::group::table.filter(schema::group::slug.eq(slug)))).get_result(conn)?;
        if taken {
            errors.add("slug", "A group with this slug already exists");
        }
    }
    if description.chars().count() > group::MAX_DESCRIPTION_LENGTH {
        errors.add(
            "description",
            format!("Description can be at most {} characters", group::MAX_DESCRIPTION_LENGTH),
        );
    }
    if !errors.is_empty() {
        return Err(AdminError::InvalidInput(errors));
    }

    NewGroup {
        title,
        slug,
        description,
    }
    .insert_into(schema::group::table)
    .returning(Group::as_returning())
    .get_result(conn)
    .map_err(AdminError::from)
}

/// Deletes the group with the given `slug`. Posts in the group lose their group.
fn delete(conn: &mut SqliteConnection, slug: &str) -> AdminResult<Group> {
    let group = by_slug(conn, slug)?.ok_or_else(|| AdminError::MissingGroup(slug.to_owned()))?;
    diesel::delete(schema::group::table.find(group.id)).execute(conn)?;
    Ok(group)
}
