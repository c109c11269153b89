use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Client portfolio segment. The legacy "leal" label still shows up in
/// older exports and is folded into `Promotor` at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Promotor,
    Riesgo,
    Inactivo,
    Nuevo,
    Activo,
}

impl Segment {
    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "promotor" | "leal" => Ok(Segment::Promotor),
            "riesgo" => Ok(Segment::Riesgo),
            "inactivo" => Ok(Segment::Inactivo),
            "nuevo" => Ok(Segment::Nuevo),
            "activo" => Ok(Segment::Activo),
            other => Err(anyhow!("unknown segment {other:?}")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Promotor => "promotor",
            Segment::Riesgo => "riesgo",
            Segment::Inactivo => "inactivo",
            Segment::Nuevo => "nuevo",
            Segment::Activo => "activo",
        }
    }

    /// Spanish display labels used by the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            Segment::Promotor => "Promotores",
            Segment::Riesgo => "En riesgo",
            Segment::Inactivo => "Inactivos",
            Segment::Nuevo => "Nuevos",
            Segment::Activo => "Activos",
        }
    }

    pub fn all() -> [Segment; 5] {
        [
            Segment::Promotor,
            Segment::Riesgo,
            Segment::Inactivo,
            Segment::Nuevo,
            Segment::Activo,
        ]
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub segment: Segment,
    pub industry: String,
    pub tags: String,
    pub last_visit_date: NaiveDate,
    pub months_active: u32,
    pub avg_tx_growth: f32,
    pub nps_last: i32,
    pub lifetime_value: f32,
    /// Pipe-delimited product list
    pub products: String,
}

impl Client {
    pub fn products_detail(&self) -> Vec<String> {
        self.products.split('|').map(|p| p.to_string()).collect()
    }
}

const CSV_HEADERS: [&str; 11] = [
    "id",
    "name",
    "segment",
    "industry",
    "tags",
    "last_visit_date",
    "months_active",
    "avg_tx_growth",
    "nps_last",
    "lifetime_value",
    "products",
];

/// Read-only client reference set, loaded once at process start.
#[derive(Debug, Clone, Default)]
pub struct ClientBook {
    list: Vec<Client>,
}

impl ClientBook {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let mut csv_reader = csv::Reader::from_path(path)?;

        let headers = csv_reader.headers()?.clone();
        for expected in CSV_HEADERS {
            if !headers.iter().any(|h| h == expected) {
                return Err(anyhow!("clients csv is missing column {expected:?}"));
            }
        }
        let col = |name: &str| headers.iter().position(|h| h == name).unwrap();
        let (id_c, name_c, segment_c, industry_c, tags_c) = (
            col("id"),
            col("name"),
            col("segment"),
            col("industry"),
            col("tags"),
        );
        let (visit_c, months_c, growth_c, nps_c, ltv_c, products_c) = (
            col("last_visit_date"),
            col("months_active"),
            col("avg_tx_growth"),
            col("nps_last"),
            col("lifetime_value"),
            col("products"),
        );

        let mut list = vec![];
        for record in csv_reader.records() {
            let record = record?;
            let field = |idx: usize| record.get(idx).unwrap_or_default().trim().to_string();

            let client = Client {
                id: field(id_c),
                name: field(name_c),
                segment: Segment::parse(&field(segment_c))?,
                industry: field(industry_c),
                tags: field(tags_c),
                last_visit_date: NaiveDate::parse_from_str(&field(visit_c), "%Y-%m-%d")?,
                months_active: field(months_c).parse()?,
                avg_tx_growth: field(growth_c).parse()?,
                nps_last: field(nps_c).parse()?,
                lifetime_value: field(ltv_c).parse()?,
                products: field(products_c),
            };

            list.push(client);
        }

        log::info!("loaded {} clients from {path}", list.len());

        Ok(ClientBook { list })
    }

    pub fn all(&self) -> &[Client] {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn by_segment(&self, segment: Segment) -> Vec<&Client> {
        self.list.iter().filter(|c| c.segment == segment).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Client> {
        self.list.iter().find(|c| c.id == id)
    }

    pub fn count_where<F: Fn(&Client) -> bool>(&self, pred: F) -> usize {
        self.list.iter().filter(|c| pred(c)).count()
    }

    #[cfg(test)]
    pub fn from_list(list: Vec<Client>) -> Self {
        ClientBook { list }
    }
}

#[cfg(test)]
pub fn test_client(id: &str, segment: Segment, lifetime_value: f32) -> Client {
    Client {
        id: id.to_string(),
        name: format!("Cliente {id}"),
        segment,
        industry: "retail".to_string(),
        tags: "pagos qr".to_string(),
        last_visit_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        months_active: 12,
        avg_tx_growth: 0.1,
        nps_last: 8,
        lifetime_value,
        products: "pos|link".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_leal_normalizes_to_promotor() {
        assert_eq!(Segment::parse("leal").unwrap(), Segment::Promotor);
        assert_eq!(Segment::parse("Promotor").unwrap(), Segment::Promotor);
        assert!(Segment::parse("vip").is_err());
    }

    #[test]
    fn loads_clients_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clients.csv");
        std::fs::write(
            &path,
            "id,name,segment,industry,tags,last_visit_date,months_active,avg_tx_growth,nps_last,lifetime_value,products\n\
             c1,Bodega Sol,leal,retail,pagos qr,2024-02-10,18,0.12,9,15400.5,pos|link\n\
             c2,Farmacia Luna,riesgo,farmacia,delivery,2024-01-05,6,-0.3,5,2300.0,pos\n",
        )
        .unwrap();

        let book = ClientBook::load(path.to_str().unwrap()).unwrap();
        assert_eq!(book.len(), 2);

        let c1 = book.get("c1").unwrap();
        assert_eq!(c1.segment, Segment::Promotor);
        assert_eq!(c1.products_detail(), vec!["pos", "link"]);
        assert_eq!(book.by_segment(Segment::Riesgo).len(), 1);
        assert!(book.get("missing").is_none());
    }
}
