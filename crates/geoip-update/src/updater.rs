use crate::{
    challenge::compute_challenge,
    digest::ContentDigest,
    error::{Result, UpdateError},
    identity::{ClientIdentity, Credential, ProductId},
    publish::publish,
    session::{ServerReply, SessionState, UpdateSession},
    transport::Transport,
};
use std::path::{Path, PathBuf};

/// Endpoint returning the caller's public address.
pub const IP_ADDRESS_PATH: &str = "/app/update_getipaddr";
/// Endpoint returning the destination filename for a product.
pub const FILENAME_PATH: &str = "/app/update_getfilename";
/// Digest-polling download endpoint.
pub const UPDATE_PATH: &str = "/app/update_secure";

/// Updater driving the polling protocol for a set of database products.
pub struct Updater<T> {
    transport: T,
    credential: Credential,
    directory: PathBuf,
}

impl<T> Updater<T>
where
    T: Transport,
{
    /// Create a new updater writing into `directory`.
    pub fn new(transport: T, credential: Credential, directory: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            credential,
            directory: directory.into(),
        }
    }

    /// Directory the database files live in.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Ask the service which public address it sees for this client.
    pub async fn client_identity(&self) -> Result<ClientIdentity> {
        let body = self
            .transport
            .fetch(IP_ADDRESS_PATH, &[])
            .await?
            .into_success_body(IP_ADDRESS_PATH)?;
        let identity = ClientIdentity::new(body.to_vec());
        tracing::debug!("service reports client address {}", identity);
        Ok(identity)
    }

    /// Ask the service for the local filename of `product`.
    ///
    /// Only the base name of the reply is used.
    pub async fn remote_filename(&self, product: &ProductId) -> Result<String> {
        let body = self
            .transport
            .fetch(FILENAME_PATH, &[("product_id", product.as_str())])
            .await?
            .into_success_body(FILENAME_PATH)?;
        base_name(&String::from_utf8_lossy(&body))
    }

    async fn poll(&self, session: &UpdateSession) -> Result<ServerReply> {
        let digest = session.current_digest().to_hex();
        let challenge = session.challenge().to_hex();
        let query = [
            ("db_md5", digest.as_str()),
            ("challenge_md5", challenge.as_str()),
            ("user_id", self.credential.account_id()),
            ("edition_id", session.product_id().as_str()),
        ];

        let body = self
            .transport
            .fetch(UPDATE_PATH, &query)
            .await?
            .into_success_body(UPDATE_PATH)?;
        Ok(ServerReply::classify(body))
    }

    /// Bring a single product up to date.
    pub async fn update_product(
        &self,
        identity: &ClientIdentity,
        product: &ProductId,
    ) -> Result<ProductOutcome> {
        let filename = self.remote_filename(product).await?;
        tracing::info!("Attempting to update {}", filename);

        let path = self.directory.join(&filename);
        let local_digest = ContentDigest::of_file(&path).await;
        let challenge = compute_challenge(self.credential.license_key(), identity);
        let mut session = UpdateSession::new(product.clone(), filename, local_digest, challenge);
        tracing::debug!(
            "polling for {} with local digest {}",
            session.remote_filename(),
            local_digest
        );

        while !session.state().is_terminal() {
            let reply = self.poll(&session).await?;
            session.advance(reply)?;
        }

        let rounds = session.rounds();
        match session.into_payload()? {
            Some(payload) => {
                publish(&path, payload).await?;
                tracing::info!("Update retrieved for {} in {} round(s)", path.display(), rounds);
                Ok(ProductOutcome::Updated { path, rounds })
            }
            None => {
                tracing::info!("No new updates available for {}", path.display());
                Ok(ProductOutcome::UpToDate { path })
            }
        }
    }

    /// Update every product in order. A failure only affects its own product.
    pub async fn update_all(&self, identity: &ClientIdentity, products: &[ProductId]) -> RunReport {
        let mut report = RunReport::default();
        for product in products {
            let result = self.update_product(identity, product).await;
            if let Err(err) = &result {
                tracing::warn!(
                    "update of product {} failed ({:?}): {}",
                    product,
                    err.kind(),
                    err
                );
            }
            report.entries.push(ProductReport {
                product: product.clone(),
                result,
            });
        }
        report
    }
}

/// Strip a server-supplied name down to its final path component.
fn base_name(raw: &str) -> Result<String> {
    let name = raw
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        return Err(UpdateError::InvalidFilename(raw.to_string()));
    }
    Ok(name.to_string())
}

/// Result of updating one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductOutcome {
    /// A newer file was published.
    Updated {
        /// Final location of the database.
        path: PathBuf,
        /// Number of payload rounds consumed.
        rounds: u32,
    },
    /// The installed file was already current.
    UpToDate {
        /// Location of the database.
        path: PathBuf,
    },
}

/// Outcome for one product of a run.
#[derive(Debug)]
pub struct ProductReport {
    pub product: ProductId,
    pub result: Result<ProductOutcome>,
}

/// Outcomes of a whole run, in request order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub entries: Vec<ProductReport>,
}

impl RunReport {
    /// Products for which a new file was published.
    pub fn updated(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.result, Ok(ProductOutcome::Updated { .. })))
            .count()
    }

    /// Products that were already current.
    pub fn up_to_date(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.result, Ok(ProductOutcome::UpToDate { .. })))
            .count()
    }

    /// Products whose session failed.
    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|entry| entry.result.is_err()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}
