
use crate::{app::App, config::Config, discovery::SearchFetcher};
use std::sync::Arc;

pub const CLIENTS_CSV: &str = "\
id,name,segment,industry,tags,last_visit_date,months_active,avg_tx_growth,nps_last,lifetime_value,products
c1,Bodega Sol,leal,retail,pagos qr,2024-02-10,18,0.12,9,15400.5,pos|link
c2,Farmacia Luna,riesgo,farmacia,delivery,2024-01-05,6,-0.3,5,2300.0,pos
c3,Mercado Norte,inactivo,retail,pagos delivery,2023-11-20,1,-0.25,4,800.0,pos
c4,Cafe Andino,activo,restaurante,delivery qr,2024-03-02,3,0.4,8,5100.0,pos|qr
";

pub const ALERTS_CSV: &str = "\
id,client_id,severity,message,created_at
a1,c2,alta,NPS en caída,2024-03-01
";

pub const PROSPECTS_CSV: &str = "\
name,site,channel,category,region,handle,has_qr,has_link,has_card,delivery,reviews,rating,followers,similarity_seed,lat,lon,similarity_score
Minimarket Retail Lima,https://miniretail.pe,web,retail,Lima,@miniretail,true,false,false,true,12,4.5,,0.8,-12.05,-77.04,0
Taller Mecanico,https://taller.pe,web,servicios,Lima,@taller,false,false,false,false,,,,0.2,-12.01,-77.02,0
Libreria Cusco,https://libros.pe,web,retail,Arequipa,@libros,false,true,false,false,3,3.9,,0.5,-16.40,-71.53,0
";

pub struct StubFetcher {
    pub html: String,
}

impl SearchFetcher for StubFetcher {
    fn fetch(&self, _target_url: &str) -> anyhow::Result<String> {
        Ok(self.html.clone())
    }
}

pub fn result_html(sites: &[(&str, &str)]) -> String {
    let mut html = String::from("<html><body><ol>");
    for (name, site) in sites {
        html.push_str(&format!(
            r#"<li class="b_algo"><h2><a href="{site}">{name}</a></h2></li>"#
        ));
    }
    html.push_str("</ol></body></html>");
    html
}

/// Creates an isolated App over a unique temp directory seeded with the
/// fixture CSVs. Each test gets its own directory so parallel tests
/// never collide.
pub fn create_app(fetcher: Arc<dyn SearchFetcher>) -> (App, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let base_path = tmp.path().to_str().unwrap().to_string();

    std::fs::write(tmp.path().join("clients.csv"), CLIENTS_CSV).unwrap();
    std::fs::write(tmp.path().join("alerts.csv"), ALERTS_CSV).unwrap();
    std::fs::write(tmp.path().join("prospects.csv"), PROSPECTS_CSV).unwrap();

    let config = Config::load_with(&base_path);
    let app = App::with_fetcher(config, &base_path, fetcher).expect("failed to build app");
    (app, tmp)
}

pub fn create_app_with_stub(html: String) -> (App, tempfile::TempDir) {
    create_app(Arc::new(StubFetcher { html }))
}
