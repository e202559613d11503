use crate::types::EntityId;

/// A selectable catalog record.
///
/// This is the rendering strategy of a selector: which id it stands for, what
/// to display, which fields the free-text filter looks at, and whether a
/// business rule forbids picking it.
pub trait Candidate: Clone + Send + Sync + 'static {
    fn id(&self) -> EntityId;

    fn label(&self) -> String;

    /// Fields matched by the local filter. Defaults to the label.
    fn search_fields(&self) -> Vec<String> {
        vec![self.label()]
    }

    /// Why this record cannot be picked, if it cannot.
    fn unavailable_reason(&self) -> Option<String> {
        None
    }
}

/// Case-insensitive substring match of `query` against any search field.
///
/// A blank query matches everything.
#[must_use]
pub fn matches_query<T: Candidate>(candidate: &T, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    candidate
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Local-mode filtering: keeps order, clones the matches.
#[must_use]
pub fn filter_local<T: Candidate>(items: &[T], query: &str) -> Vec<T> {
    items
        .iter()
        .filter(|item| matches_query(*item, query))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Named {
        id: i64,
        label: &'static str,
        code: &'static str,
    }

    impl Candidate for Named {
        fn id(&self) -> EntityId {
            EntityId::from(self.id)
        }

        fn label(&self) -> String {
            self.label.to_string()
        }

        fn search_fields(&self) -> Vec<String> {
            vec![self.label.to_string(), self.code.to_string()]
        }
    }

    fn warehouses() -> Vec<Named> {
        vec![
            Named {
                id: 1,
                label: "Bodega Central",
                code: "BC-01",
            },
            Named {
                id: 2,
                label: "Bodega Norte",
                code: "BN-02",
            },
        ]
    }

    #[test]
    fn filters_case_insensitively() {
        let filtered = filter_local(&warehouses(), "norte");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 2);

        assert_eq!(filter_local(&warehouses(), "NORTE"), filtered);
    }

    #[test]
    fn matches_secondary_fields() {
        let filtered = filter_local(&warehouses(), "bc-0");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
    }

    #[test]
    fn blank_query_keeps_everything_in_order() {
        let all = filter_local(&warehouses(), "   ");
        assert_eq!(all, warehouses());
    }

    #[test]
    fn no_match_is_empty() {
        assert!(filter_local(&warehouses(), "sur").is_empty());
    }
}
