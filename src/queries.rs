//! Query generation: the cross product of tracked companies and key terms.

use crate::models::QueryUnit;

/// Produce every (company, key term) pair in company-major order.
///
/// Pure and infallible. The order only matters for deterministic fixtures
/// and stable progress reporting, not for correctness.
pub fn cross(companies: &[String], key_terms: &[String]) -> Vec<QueryUnit> {
    let mut units = Vec::with_capacity(companies.len() * key_terms.len());
    for company in companies {
        for term in key_terms {
            units.push(QueryUnit {
                company: company.clone(),
                key_term: term.clone(),
            });
        }
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cross_length() {
        let units = cross(
            &strings(&["Acme", "Volvo", "Carlsberg"]),
            &strings(&["Warehouse", "CEO", "Funding", "Merger"]),
        );
        assert_eq!(units.len(), 12);
    }

    #[test]
    fn test_cross_no_duplicates() {
        let units = cross(&strings(&["Acme", "Volvo"]), &strings(&["CEO", "Funding"]));
        let unique: HashSet<_> = units.iter().collect();
        assert_eq!(unique.len(), units.len());
    }

    #[test]
    fn test_cross_company_major_order() {
        let units = cross(&strings(&["Acme", "Volvo"]), &strings(&["CEO", "Funding"]));
        let pairs: Vec<(&str, &str)> = units
            .iter()
            .map(|u| (u.company.as_str(), u.key_term.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Acme", "CEO"),
                ("Acme", "Funding"),
                ("Volvo", "CEO"),
                ("Volvo", "Funding"),
            ]
        );
    }

    #[test]
    fn test_cross_empty_terms() {
        assert!(cross(&strings(&["Acme"]), &[]).is_empty());
    }
}
