//! Built-in resource types.
//!
//! Each type here is a zero-sized marker implementing
//! [`ResourceType`](crate::rest::ResourceType): it names the endpoint slugs
//! and declares which attributes the API accepts on save. Everything else
//! about a resource stays schema-less in its payload.

use crate::rest::resource::{EditAttr, ResourceType};

/// A citizen science project.
pub struct Project;

impl ResourceType for Project {
    const NAME: &'static str = "project";
    const SLUG: &'static str = "projects";
    const LINK_SLUG: &'static str = "project";
    const EDIT_ATTRIBUTES: &'static [EditAttr] = &[
        EditAttr::Field("display_name"),
        EditAttr::Field("description"),
        EditAttr::Field("introduction"),
        EditAttr::Field("primary_language"),
        EditAttr::Field("private"),
        EditAttr::Field("tags"),
    ];
}

/// A classification workflow within a project.
pub struct Workflow;

impl ResourceType for Workflow {
    const NAME: &'static str = "workflow";
    const SLUG: &'static str = "workflows";
    const LINK_SLUG: &'static str = "workflow";
    const EDIT_ATTRIBUTES: &'static [EditAttr] = &[
        EditAttr::Field("display_name"),
        EditAttr::Field("active"),
        EditAttr::Field("first_task"),
        EditAttr::Field("tasks"),
        EditAttr::Nested {
            key: "retirement",
            fields: &["criteria", "options"],
        },
    ];
}

/// A named set of subjects attached to a project.
pub struct SubjectSet;

impl ResourceType for SubjectSet {
    const NAME: &'static str = "subject_set";
    const SLUG: &'static str = "subject_sets";
    const LINK_SLUG: &'static str = "subject_set";
    const EDIT_ATTRIBUTES: &'static [EditAttr] = &[EditAttr::Field("display_name")];
}

/// A volunteer's completed classification. Read-only.
pub struct Classification;

impl ResourceType for Classification {
    const NAME: &'static str = "classification";
    const SLUG: &'static str = "classifications";
    const LINK_SLUG: &'static str = "classification";
    const EDIT_ATTRIBUTES: &'static [EditAttr] = &[];
}
