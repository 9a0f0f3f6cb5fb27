// src/gdp.rs
//
// Per-city, per-year GDP from the statistics bureau's "easyquery" endpoint.

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{fs, path::Path, thread};
use tracing::{debug, info, instrument, warn};

use crate::config::GdpConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GdpRecord {
    pub city: String,
    pub code: String,
    pub year: i32,
    pub gdp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    returndata: ReturnData,
}

#[derive(Debug, Deserialize)]
struct ReturnData {
    datanodes: Vec<DataNode>,
}

#[derive(Debug, Deserialize)]
struct DataNode {
    data: NodeData,
}

#[derive(Debug, Deserialize)]
struct NodeData {
    data: Value,
}

/// Value of the first data node. The bureau sends it as a number, but a
/// numeric string is accepted too.
pub fn parse_gdp_response(body: &str) -> Result<f64> {
    let resp: QueryResponse = serde_json::from_str(body).context("decoding query response")?;
    let node = resp
        .returndata
        .datanodes
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("response has no data nodes"))?;
    match node.data.data {
        Value::Number(n) => n.as_f64().ok_or_else(|| anyhow!("number out of range")),
        Value::String(s) => s.trim().parse().with_context(|| format!("parsing `{}`", s)),
        other => Err(anyhow!("unexpected data value {}", other)),
    }
}

pub struct GdpClient {
    client: Client,
    cfg: GdpConfig,
}

impl GdpClient {
    pub fn new(cfg: GdpConfig) -> Result<Self> {
        let client = Client::builder().build().context("building HTTP client")?;
        Ok(Self::with_client(client, cfg))
    }

    pub fn with_client(client: Client, cfg: GdpConfig) -> Self {
        Self { client, cfg }
    }

    fn query(&self, code: &str, year: i32) -> [(&'static str, String); 6] {
        [
            ("m", "QueryData".to_string()),
            ("dbcode", self.cfg.db_code.clone()),
            ("rowcode", "reg".to_string()),
            ("colcode", "sj".to_string()),
            (
                "wds",
                json!([{ "wdcode": "zb", "valuecode": self.cfg.indicator }]).to_string(),
            ),
            (
                "dfwds",
                json!([
                    { "wdcode": "reg", "valuecode": code },
                    { "wdcode": "sj", "valuecode": year.to_string() },
                ])
                .to_string(),
            ),
        ]
    }

    fn try_fetch(&self, code: &str, year: i32) -> Result<f64> {
        let resp = self
            .client
            .get(&self.cfg.api_url)
            .header(reqwest::header::USER_AGENT, &self.cfg.user_agent)
            .timeout(self.cfg.timeout())
            .query(&self.query(code, year))
            .send()
            .with_context(|| format!("GET {}", self.cfg.api_url))?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(anyhow!("HTTP status {}", status));
        }
        let body = resp.text().context("reading response body")?;
        parse_gdp_response(&body)
    }

    /// GDP for one region and year, or `None` on any failure.
    pub fn fetch_gdp(&self, code: &str, year: i32) -> Option<f64> {
        match self.try_fetch(code, year) {
            Ok(v) => {
                debug!(code, year, gdp = v, "fetched");
                Some(v)
            }
            Err(e) => {
                warn!(code, year, error = %format!("{:#}", e), "no GDP value");
                None
            }
        }
    }

    /// Every configured city × year, sleeping the configured delay after each request.
    #[instrument(level = "info", skip(self), fields(cities = self.cfg.cities.len()))]
    pub fn scrape(&self, years: &[i32]) -> Vec<GdpRecord> {
        let mut out = Vec::with_capacity(self.cfg.cities.len() * years.len());
        for city in &self.cfg.cities {
            for &year in years {
                out.push(GdpRecord {
                    city: city.name.clone(),
                    code: city.code.clone(),
                    year,
                    gdp: self.fetch_gdp(&city.code, year),
                });
                thread::sleep(self.cfg.delay());
            }
        }
        let found = out.iter().filter(|r| r.gdp.is_some()).count();
        info!(records = out.len(), found, "scrape finished");
        out
    }
}

/// Header `city,code,year,gdp`; a missing value is an empty cell.
pub fn save_csv(records: &[GdpRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    if records.is_empty() {
        wtr.write_record(["city", "code", "year", "gdp"])?;
    }
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CityCode;
    use crate::test_support::{dead_url, init_test_logging, local_client, server};
    use tempfile::tempdir;

    const BODY: &str = r#"{"returncode":200,"returndata":{"datanodes":[
        {"code":"zb.A020101_reg.110000_sj.2021","data":{"data":40269.6,"dotcount":1,"hasdata":true,"strdata":"40269.6"},
         "wds":[{"valuecode":"A020101","wdcode":"zb"}]}],"wdnodes":[]}}"#;

    fn test_cfg(api_url: String) -> GdpConfig {
        GdpConfig {
            api_url,
            cities: vec![CityCode {
                code: "110000".into(),
                name: "北京市".into(),
            }],
            delay_ms: 0,
            ..GdpConfig::default()
        }
    }

    #[test]
    fn parses_numeric_and_string_values() {
        assert_eq!(parse_gdp_response(BODY).unwrap(), 40269.6);
        let s = r#"{"returndata":{"datanodes":[{"data":{"data":"123.5"}}]}}"#;
        assert_eq!(parse_gdp_response(s).unwrap(), 123.5);
    }

    #[test]
    fn rejects_empty_or_malformed_responses() {
        assert!(parse_gdp_response(r#"{"returndata":{"datanodes":[]}}"#).is_err());
        assert!(parse_gdp_response(r#"{"returncode":501}"#).is_err());
        assert!(parse_gdp_response("<html>blocked</html>").is_err());
        assert!(parse_gdp_response(r#"{"returndata":{"datanodes":[{"data":{"data":null}}]}}"#).is_err());
    }

    #[test]
    fn query_carries_region_and_year() {
        let c = GdpClient::with_client(local_client(), GdpConfig::default());
        let q = c.query("310000", 2021);
        assert_eq!(q[1], ("dbcode", "fsnd".to_string()));
        let dfwds: Value = serde_json::from_str(&q[5].1).unwrap();
        assert_eq!(dfwds[0]["valuecode"], "310000");
        assert_eq!(dfwds[1]["valuecode"], "2021");
        let wds: Value = serde_json::from_str(&q[4].1).unwrap();
        assert_eq!(wds[0]["valuecode"], "A020101");
    }

    #[test]
    fn scrape_collects_every_city_year() {
        init_test_logging();
        let srv = server().route("/easyquery.htm", 200, "application/json", BODY).start();
        let c = GdpClient::with_client(local_client(), test_cfg(srv.url("/easyquery.htm")));
        let rows = c.scrape(&[2020, 2021]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].year, 2021);
        assert_eq!(rows[1].gdp, Some(40269.6));
        let reqs = srv.requests();
        assert_eq!(reqs.len(), 2);
        assert!(reqs[0].contains("m=QueryData"), "{}", reqs[0]);
    }

    #[test]
    fn failures_become_missing_values() {
        let srv = server().route("/easyquery.htm", 500, "text/plain", "oops").start();
        let c = GdpClient::with_client(local_client(), test_cfg(srv.url("/easyquery.htm")));
        assert_eq!(c.fetch_gdp("110000", 2020), None);

        let c = GdpClient::with_client(local_client(), test_cfg(dead_url("/easyquery.htm")));
        let rows = c.scrape(&[2019]);
        assert_eq!(rows[0].gdp, None);
        assert_eq!(rows[0].city, "北京市");
    }

    #[test]
    fn csv_has_fixed_header_and_blank_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gdp_data.csv");
        let rows = vec![
            GdpRecord {
                city: "北京市".into(),
                code: "110000".into(),
                year: 2019,
                gdp: Some(35445.1),
            },
            GdpRecord {
                city: "上海市".into(),
                code: "310000".into(),
                year: 2019,
                gdp: None,
            },
        ];
        save_csv(&rows, &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "city,code,year,gdp\n北京市,110000,2019,35445.1\n上海市,310000,2019,\n"
        );

        save_csv(&[], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "city,code,year,gdp\n");
    }
}
