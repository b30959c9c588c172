use reqwest::Url;
use std::fmt::Debug;

use crate::config::BackendEndpoint;
use crate::error::{Error, Result};

pub const IMPORT_PATH: &str = "/api/v1/import";
const SINGLE_NODE_QUERY_PATH: &str = "/api/v1/query";
const CLUSTER_QUERY_PATH: &str = "/select/0/prometheus/api/v1/query";

/// Resolves backend URLs for one deployment topology.
pub trait EndpointResolver: Debug + Send + Sync {
    /// Instant query endpoint.
    fn query_url(&self) -> Result<Url>;

    /// Base URL that accepts imports.
    fn push_base(&self) -> &str;

    fn import_url(&self) -> Result<Url> {
        let mut url = parse(self.push_base())?;
        url.set_path(IMPORT_PATH);
        Ok(url)
    }
}

/// Single-node VictoriaMetrics serving both ingestion and queries.
#[derive(Debug, Clone)]
pub struct SingleNode {
    pub url: String,
}

impl EndpointResolver for SingleNode {
    fn query_url(&self) -> Result<Url> {
        parse(&format!("{}{}", self.url.trim_end_matches('/'), SINGLE_NODE_QUERY_PATH))
    }

    fn push_base(&self) -> &str {
        &self.url
    }
}

/// Cluster deployment: imports go to vmagent, queries to vmselect.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub vmagent_url: String,
    pub vmselect_url: String,
}

impl EndpointResolver for Cluster {
    fn query_url(&self) -> Result<Url> {
        parse(&format!(
            "{}{}",
            self.vmselect_url.trim_end_matches('/'),
            CLUSTER_QUERY_PATH
        ))
    }

    fn push_base(&self) -> &str {
        &self.vmagent_url
    }
}

pub fn resolver_for(endpoint: &BackendEndpoint) -> Box<dyn EndpointResolver> {
    match endpoint {
        BackendEndpoint::SingleNode { url } => Box::new(SingleNode { url: url.clone() }),
        BackendEndpoint::Cluster {
            vmagent_url,
            vmselect_url,
        } => Box::new(Cluster {
            vmagent_url: vmagent_url.clone(),
            vmselect_url: vmselect_url.clone(),
        }),
    }
}

fn parse(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{}: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_node_urls() {
        let resolver = resolver_for(&BackendEndpoint::SingleNode {
            url: "http://victoria:8428/".to_string(),
        });
        assert_eq!(
            resolver.query_url().unwrap().as_str(),
            "http://victoria:8428/api/v1/query"
        );
        assert_eq!(
            resolver.import_url().unwrap().as_str(),
            "http://victoria:8428/api/v1/import"
        );
    }

    #[test]
    fn test_cluster_urls() {
        let resolver = resolver_for(&BackendEndpoint::Cluster {
            vmagent_url: "http://vmagent:8429".to_string(),
            vmselect_url: "http://vmselect:8481".to_string(),
        });
        assert_eq!(
            resolver.query_url().unwrap().as_str(),
            "http://vmselect:8481/select/0/prometheus/api/v1/query"
        );
        assert_eq!(
            resolver.import_url().unwrap().as_str(),
            "http://vmagent:8429/api/v1/import"
        );
    }

    #[test]
    fn test_invalid_url() {
        let resolver = SingleNode {
            url: "not a url".to_string(),
        };
        assert!(matches!(resolver.import_url(), Err(Error::InvalidUrl(_))));
    }
}
