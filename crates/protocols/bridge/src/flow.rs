//! Bridge workflow
//!
//! Drives the panel through approve and transfer. Tokens issued on the current
//! chain are locked with a deposit; wrapped tokens are burned.

use chain_client::{confirm, timed_request, SharedChainClient};
use halo_core::{units, Address, ChainError, ChainId, TxSubmission};

use crate::form::{evaluate_bridge_form, BridgeFormInputs};
use crate::state::{
    ApproveState, BridgeError, BridgeMethod, BridgePanelState, BridgeToken, ButtonState, ModalState,
};
use crate::validate::validate_destination_chain;

pub struct BridgeFlow {
    client: SharedChainClient,
    bridge: Address,
    token: BridgeToken,
    capped: bool,
    state: BridgePanelState,
}

impl BridgeFlow {
    pub fn new(client: SharedChainClient, bridge: Address, token: BridgeToken, capped: bool) -> Self {
        Self {
            client,
            bridge,
            token,
            capped,
            state: BridgePanelState::default(),
        }
    }

    pub fn state(&self) -> BridgePanelState {
        self.state
    }

    pub fn token(&self) -> &BridgeToken {
        &self.token
    }

    /// Deposit on the origin chain, burn everywhere else
    pub async fn method(&self) -> Result<BridgeMethod, BridgeError> {
        let chain_id = self.client.chain_id().await.ok_or(ChainError::NotConnected)?;
        Ok(if chain_id == self.token.origin_chain {
            BridgeMethod::Deposit
        } else {
            BridgeMethod::Burn
        })
    }

    /// Minimum, allowance and balance in display units
    ///
    /// Without an account allowance and balance read as zero.
    pub async fn form_inputs(&self) -> Result<BridgeFormInputs, BridgeError> {
        let decimals = self.token.decimals;
        let minimum = timed_request(self.client.bridge_minimum(&self.bridge)).await?;

        let (allowance, balance) = match self.client.account().await {
            Some(account) => tokio::try_join!(
                timed_request(self.client.allowance(&self.token.address, &account, &self.bridge)),
                timed_request(self.client.balance_of(&self.token.address, &account)),
            )?,
            None => (0, 0),
        };

        Ok(BridgeFormInputs {
            minimum: units::to_f64(minimum, decimals),
            allowance: units::to_f64(allowance, decimals),
            balance: units::to_f64(balance, decimals),
            capped: self.capped,
        })
    }

    /// Re-read balances and re-evaluate the form for `input`
    pub async fn refresh(&mut self, input: &str) -> Result<BridgePanelState, BridgeError> {
        let inputs = self.form_inputs().await?;
        if let Some(update) = evaluate_bridge_form(input, &inputs) {
            update.apply(&mut self.state);
        }
        Ok(self.state)
    }

    /// Approve the bridge for exactly `amount` and wait for confirmation
    pub async fn approve(&mut self, amount: &str) -> Result<TxSubmission, BridgeError> {
        let raw = units::parse_units(amount, self.token.decimals)?;
        self.state.approve = ApproveState::Approving;
        self.state.button = ButtonState::Default;

        let result = async {
            let hash =
                timed_request(self.client.approve(&self.token.address, &self.bridge, raw)).await?;
            confirm(self.client.as_ref(), &hash).await?;
            Ok::<_, ChainError>(hash)
        }
        .await;

        match result {
            Ok(hash) => {
                self.state.approve = ApproveState::Approved;
                self.state.button = ButtonState::Next;
                tracing::info!(token = %self.token.address, %hash, "Bridge approval confirmed");
                Ok(TxSubmission {
                    hash,
                    summary: format!("Approve {}", self.token.symbol),
                })
            }
            Err(e) => {
                self.state.approve = ApproveState::NotApproved;
                self.state.button = ButtonState::Default;
                tracing::warn!(token = %self.token.address, error = %e, "Bridge approval failed");
                Err(e.into())
            }
        }
    }

    /// Send `amount` towards `destination` and wait for confirmation
    ///
    /// On failure the modal is closed and the button offers a retry.
    pub async fn submit(
        &mut self,
        amount: &str,
        destination: ChainId,
    ) -> Result<TxSubmission, BridgeError> {
        self.state.button = ButtonState::Confirming;
        self.state.modal = ModalState::InProgress;

        match self.transfer(amount, destination).await {
            Ok(submission) => {
                self.state.modal = ModalState::Successful;
                tracing::info!(hash = %submission.hash, summary = %submission.summary, "Bridge transfer confirmed");
                if let Err(e) = self.refresh(amount).await {
                    tracing::warn!(error = %e, "Could not refresh bridge form");
                }
                Ok(submission)
            }
            Err(e) => {
                self.state.modal = ModalState::NotConfirmed;
                self.state.button = ButtonState::Retry;
                tracing::warn!(error = %e, "Bridge transfer failed");
                Err(e)
            }
        }
    }

    /// Closing an unconfirmed modal leaves the retry button
    pub fn dismiss_modal(&mut self) {
        if self.state.modal == ModalState::NotConfirmed {
            self.state.button = ButtonState::Retry;
        }
    }

    async fn transfer(&self, amount: &str, destination: ChainId) -> Result<TxSubmission, BridgeError> {
        let raw = units::parse_units(amount, self.token.decimals)?;
        let current = self.client.chain_id().await.ok_or(ChainError::NotConnected)?;
        validate_destination_chain(current, destination)?;

        let hash = match self.method().await? {
            BridgeMethod::Deposit => {
                timed_request(self.client.bridge_deposit(&self.bridge, raw, destination)).await?
            }
            BridgeMethod::Burn => timed_request(self.client.bridge_burn(&self.bridge, raw)).await?,
        };
        confirm(self.client.as_ref(), &hash).await?;

        Ok(TxSubmission {
            hash,
            summary: format!(
                "Bridge {} {} to {}",
                amount.trim(),
                self.token.symbol,
                destination.name()
            ),
        })
    }
}
