//! Catalog records as returned by the backend.
//!
//! Field names follow the backend's Spanish JSON keys via `serde(rename)`.

use serde::{Deserialize, Serialize};

use crate::selector::Candidate;
use crate::types::EntityId;

/// Warehouse (`bodega`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Warehouse {
    pub id: EntityId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "ubicacion", default)]
    pub location: Option<String>,
}

impl Warehouse {
    #[must_use]
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: None,
        }
    }
}

impl Candidate for Warehouse {
    fn id(&self) -> EntityId {
        self.id.clone()
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn search_fields(&self) -> Vec<String> {
        let mut fields = vec![self.name.clone()];
        fields.extend(self.location.clone());
        fields
    }
}

/// Client vehicle (`vehiculo`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Vehicle {
    pub id: EntityId,
    #[serde(rename = "placa")]
    pub plate: String,
    #[serde(rename = "marca", default)]
    pub brand: Option<String>,
    #[serde(rename = "modelo", default)]
    pub model: Option<String>,
    #[serde(rename = "cliente", default)]
    pub owner: Option<String>,
}

impl Vehicle {
    #[must_use]
    pub fn new(id: impl Into<EntityId>, plate: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            plate: plate.into(),
            brand: None,
            model: None,
            owner: None,
        }
    }

    #[must_use]
    pub fn with_brand_model(mut self, brand: impl Into<String>, model: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self.model = Some(model.into());
        self
    }
}

impl Candidate for Vehicle {
    fn id(&self) -> EntityId {
        self.id.clone()
    }

    fn label(&self) -> String {
        let description = [self.brand.as_deref(), self.model.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if description.is_empty() {
            self.plate.clone()
        } else {
            format!("{} - {description}", self.plate)
        }
    }

    fn search_fields(&self) -> Vec<String> {
        let mut fields = vec![self.plate.clone()];
        fields.extend(self.brand.clone());
        fields.extend(self.model.clone());
        fields.extend(self.owner.clone());
        fields
    }
}

/// Workshop intake receipt (`recepcion`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Receipt {
    pub id: EntityId,
    #[serde(rename = "numero")]
    pub number: String,
    #[serde(rename = "placa", default)]
    pub plate: Option<String>,
    #[serde(rename = "fecha", default)]
    pub date: Option<String>,
}

impl Candidate for Receipt {
    fn id(&self) -> EntityId {
        self.id.clone()
    }

    fn label(&self) -> String {
        match &self.plate {
            Some(plate) => format!("#{} ({plate})", self.number),
            None => format!("#{}", self.number),
        }
    }

    fn search_fields(&self) -> Vec<String> {
        let mut fields = vec![self.number.clone()];
        fields.extend(self.plate.clone());
        fields
    }
}

/// Insurance claim (`siniestro`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct InsuranceCase {
    pub id: EntityId,
    #[serde(rename = "numero_siniestro")]
    pub case_number: String,
    #[serde(rename = "aseguradora", default)]
    pub insurer: Option<String>,
}

impl Candidate for InsuranceCase {
    fn id(&self) -> EntityId {
        self.id.clone()
    }

    fn label(&self) -> String {
        match &self.insurer {
            Some(insurer) => format!("{} - {insurer}", self.case_number),
            None => self.case_number.clone(),
        }
    }

    fn search_fields(&self) -> Vec<String> {
        let mut fields = vec![self.case_number.clone()];
        fields.extend(self.insurer.clone());
        fields
    }
}

/// Document numbering sequence (`consecutivo`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Sequence {
    pub id: EntityId,
    #[serde(rename = "prefijo")]
    pub prefix: String,
    #[serde(rename = "actual", default)]
    pub current: i64,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
}

impl Candidate for Sequence {
    fn id(&self) -> EntityId {
        self.id.clone()
    }

    fn label(&self) -> String {
        match &self.description {
            Some(description) => format!("{} - {description}", self.prefix),
            None => self.prefix.clone(),
        }
    }

    fn search_fields(&self) -> Vec<String> {
        let mut fields = vec![self.prefix.clone()];
        fields.extend(self.description.clone());
        fields
    }
}

/// Inventory item (`producto`). Out-of-stock items are listed but not pickable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Product {
    pub id: EntityId,
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "existencia", default)]
    pub stock: f64,
}

impl Product {
    #[must_use]
    pub fn new(id: impl Into<EntityId>, code: impl Into<String>, name: impl Into<String>, stock: f64) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            stock,
        }
    }
}

impl Candidate for Product {
    fn id(&self) -> EntityId {
        self.id.clone()
    }

    fn label(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }

    fn search_fields(&self) -> Vec<String> {
        vec![self.code.clone(), self.name.clone()]
    }

    fn unavailable_reason(&self) -> Option<String> {
        (self.stock.is_nan() || self.stock <= 0.0)
            .then(|| format!("{} has no stock available", self.name))
    }
}
