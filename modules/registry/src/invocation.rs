//! Function-name dispatch
//!
//! Hosts address the record store by function name and positional string
//! arguments. Both the current operation names and the legacy chaincode
//! names (`InitLedger`, `CreateProp`, ...) are accepted.

use landreg_core::{
    ChaincodeStub, KeyedRecord, OwnerReport, PropertyRecord, RegistryError, RegistryResult,
};
use serde::{Deserialize, Serialize};

use crate::contract::RecordStore;

/// One record store operation with its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "snake_case")]
pub enum Invocation {
    SeedLedger,
    CreateRecord { key: String, record: PropertyRecord },
    ReadRecord { key: String },
    ListAllRecords,
    TransferOwner { key: String, new_owner: String },
    QueryByOwner { owner: String },
}

fn expect_args(function: &str, args: &[String], count: usize) -> RegistryResult<()> {
    if args.len() != count {
        return Err(RegistryError::InvalidArgument(format!(
            "{} expects {} argument(s), got {}",
            function,
            count,
            args.len()
        )));
    }
    Ok(())
}

impl Invocation {
    /// Parse a function name and positional arguments
    pub fn from_args(function: &str, args: &[String]) -> RegistryResult<Self> {
        match function {
            "SeedLedger" | "InitLedger" => {
                expect_args(function, args, 0)?;
                Ok(Invocation::SeedLedger)
            }
            "CreateRecord" | "CreateProp" => {
                expect_args(function, args, 6)?;
                Ok(Invocation::CreateRecord {
                    key: args[0].clone(),
                    record: PropertyRecord::new(
                        args[1].clone(),
                        args[2].clone(),
                        args[3].clone(),
                        args[4].clone(),
                        args[5].clone(),
                    ),
                })
            }
            "ReadRecord" | "QueryProp" => {
                expect_args(function, args, 1)?;
                Ok(Invocation::ReadRecord {
                    key: args[0].clone(),
                })
            }
            "ListAllRecords" | "ListAllProps" => {
                expect_args(function, args, 0)?;
                Ok(Invocation::ListAllRecords)
            }
            "TransferOwner" | "ChangePropOwner" => {
                expect_args(function, args, 2)?;
                Ok(Invocation::TransferOwner {
                    key: args[0].clone(),
                    new_owner: args[1].clone(),
                })
            }
            "QueryByOwner" | "GetAllPropsforOwner" => {
                expect_args(function, args, 1)?;
                Ok(Invocation::QueryByOwner {
                    owner: args[0].clone(),
                })
            }
            other => Err(RegistryError::InvalidArgument(format!(
                "unknown function {}",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Invocation::SeedLedger => "SeedLedger",
            Invocation::CreateRecord { .. } => "CreateRecord",
            Invocation::ReadRecord { .. } => "ReadRecord",
            Invocation::ListAllRecords => "ListAllRecords",
            Invocation::TransferOwner { .. } => "TransferOwner",
            Invocation::QueryByOwner { .. } => "QueryByOwner",
        }
    }
}

/// Result of an [`Invocation`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InvocationOutput {
    Seeded { seeded: usize },
    Created { created: String },
    Record(PropertyRecord),
    Records(Vec<KeyedRecord>),
    Transferred(KeyedRecord),
    Report(Vec<OwnerReport>),
}

impl RecordStore {
    /// Run `invocation` against `ctx`
    pub async fn invoke(
        &self,
        ctx: &dyn ChaincodeStub,
        invocation: Invocation,
    ) -> RegistryResult<InvocationOutput> {
        match invocation {
            Invocation::SeedLedger => {
                let seeded = self.seed_ledger(ctx).await?;
                Ok(InvocationOutput::Seeded { seeded })
            }
            Invocation::CreateRecord { key, record } => {
                self.create_record(ctx, &key, &record).await?;
                Ok(InvocationOutput::Created { created: key })
            }
            Invocation::ReadRecord { key } => {
                Ok(InvocationOutput::Record(self.read_record(ctx, &key).await?))
            }
            Invocation::ListAllRecords => {
                Ok(InvocationOutput::Records(self.list_all_records(ctx).await?))
            }
            Invocation::TransferOwner { key, new_owner } => {
                let record = self.transfer_owner(ctx, &key, &new_owner).await?;
                Ok(InvocationOutput::Transferred(KeyedRecord { key, record }))
            }
            Invocation::QueryByOwner { owner } => {
                Ok(InvocationOutput::Report(self.query_by_owner(ctx, &owner).await?))
            }
        }
    }
}
