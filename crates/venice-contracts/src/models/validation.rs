use super::catalog::ModelCatalog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelCheck {
    /// The requested model is listed in the catalog.
    Accepted,
    /// The catalog could not be fetched; generation proceeds unchecked.
    Unverified { reason: String },
    Rejected { requested: String, available: Vec<String> },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ModelValidator;

impl ModelValidator {
    pub fn new() -> Self {
        Self
    }

    /// Checks an explicitly requested model against a catalog lookup result.
    ///
    /// `catalog` is the outcome of fetching the live catalog; an `Err`
    /// carries the reason it could not be fetched.
    pub fn check(&self, requested: &str, catalog: Result<&ModelCatalog, &str>) -> ModelCheck {
        let catalog = match catalog {
            Ok(catalog) => catalog,
            Err(reason) => {
                return ModelCheck::Unverified {
                    reason: reason.to_string(),
                }
            }
        };
        if catalog.is_empty() {
            return ModelCheck::Unverified {
                reason: "model catalog is empty".to_string(),
            };
        }
        if catalog.contains(requested) {
            return ModelCheck::Accepted;
        }
        ModelCheck::Rejected {
            requested: requested.to_string(),
            available: catalog.ids(),
        }
    }
}
