//! Field visibility
//!
//! - allowed = schema fields, minus `exclude`, intersected with `allow`
//!   (an empty list counts as not configured)
//! - selected = `persist` followed by the requested fields that are allowed,
//!   or every allowed field when none were requested
//!
//! `persist` fields are returned even when excluded or not allowed.

use super::options::QueryOptions;

/// Schema fields the route may return
pub fn allowed_fields<'a>(fields: impl IntoIterator<Item = &'a str>, options: &QueryOptions) -> Vec<String> {
    let exclude = options.exclude.as_deref().filter(|list| !list.is_empty());
    let allow = options.allow.as_deref().filter(|list| !list.is_empty());

    fields
        .into_iter()
        .filter(|field| exclude.map_or(true, |list| !list.iter().any(|f| f == field)))
        .filter(|field| allow.map_or(true, |list| list.iter().any(|f| f == field)))
        .map(str::to_string)
        .collect()
}

/// Fields to project for a request
pub fn select_fields(requested: &[String], allowed: &[String], persist: &[String]) -> Vec<String> {
    let chosen: Vec<&String> = if requested.is_empty() {
        allowed.iter().collect()
    } else {
        requested.iter().filter(|field| allowed.contains(field)).collect()
    };

    let mut select: Vec<String> = Vec::with_capacity(persist.len() + chosen.len());
    for field in persist.iter().chain(chosen) {
        if !select.contains(field) {
            select.push(field.clone());
        }
    }
    select
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: [&str; 5] = ["id", "name", "secret", "createdAt", "updatedAt"];

    fn strings(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_no_lists_allows_everything() {
        let allowed = allowed_fields(FIELDS, &QueryOptions::default());
        assert_eq!(allowed, strings(&FIELDS));
    }

    #[test]
    fn test_exclude_and_allow_combine() {
        let options = QueryOptions::default()
            .exclude(["secret"])
            .allow(["id", "name", "secret"]);
        assert_eq!(allowed_fields(FIELDS, &options), strings(&["id", "name"]));
    }

    #[test]
    fn test_empty_lists_count_as_absent() {
        let options = QueryOptions::default()
            .exclude(Vec::<String>::new())
            .allow(Vec::<String>::new());
        assert_eq!(allowed_fields(FIELDS, &options).len(), FIELDS.len());
    }

    #[test]
    fn test_persist_wins_over_exclude() {
        let options = QueryOptions::default().exclude(["secret"]).persist(["secret"]);
        let allowed = allowed_fields(FIELDS, &options);
        let select = select_fields(&[], &allowed, &options.persist);

        assert!(select.contains(&"secret".to_string()));
        assert_eq!(select[0], "secret");
    }

    #[test]
    fn test_requested_field_outside_allow_list_is_dropped() {
        let options = QueryOptions::default().allow(["id", "name"]);
        let allowed = allowed_fields(FIELDS, &options);
        let select = select_fields(&strings(&["name", "secret"]), &allowed, &options.persist);

        assert_eq!(select, strings(&["name"]));
    }

    #[test]
    fn test_no_duplicates_between_persist_and_requested() {
        let allowed = allowed_fields(FIELDS, &QueryOptions::default());
        let select = select_fields(&strings(&["id", "name"]), &allowed, &strings(&["id"]));

        assert_eq!(select, strings(&["id", "name"]));
    }
}
