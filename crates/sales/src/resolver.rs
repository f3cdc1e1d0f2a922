//! Identity resolution.
//!
//! Decides whether the people named on a sale are already members. A
//! person is matched either by email used as login name, or by first and
//! last name profile values, and only holders of the member role count.
//! An associate sharing the primary member's email is matched by names only.

use db::{
    directory::{Directory, DirectoryError},
    ledger::{Sale, SaleMember},
    DatabaseTransaction,
};

/// Existing member identifiers of the primary and associate member.
///
/// `0` means that no existing member matches the person.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Resolved {
    pub primary: i64,
    pub associate: i64,
}

impl Resolved {
    /// Whether the primary member is renewing an existing membership.
    pub fn is_renewal(&self) -> bool {
        self.primary > 0
    }
}

/// Look up the existing members named on `sale`.
pub async fn resolve(
    directory: &Directory,
    txn: &DatabaseTransaction,
    sale: &Sale,
) -> Result<Resolved, DirectoryError> {
    let primary = lookup(directory, txn, &sale.primary, &sale.primary.email).await?;

    let associate = if sale.associate.is_present() {
        lookup(directory, txn, &sale.associate, sale.associate_email()).await?
    } else {
        0
    };

    Ok(Resolved { primary, associate })
}

async fn lookup(
    directory: &Directory,
    txn: &DatabaseTransaction,
    person: &SaleMember,
    email: &str,
) -> Result<i64, DirectoryError> {
    directory
        .lookup_member_user_id(txn, &person.first_name, &person.last_name, email)
        .await
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use db::{
        directory::{fields, Directory},
        ledger::{Sale, SaleMember},
        role, TransactionTrait,
    };

    use super::{resolve, Resolved};
    use crate::testing::create_database;

    fn sale(associate: SaleMember) -> Sale {
        let mut sale = Sale::new("Stripe", 2025);

        sale.primary = SaleMember {
            first_name: String::from("Pierre"),
            last_name: String::from("Curie"),
            email: String::from("pc@ex.org"),
            ..Default::default()
        };
        sale.associate = associate;

        sale
    }

    fn marie() -> SaleMember {
        SaleMember {
            first_name: String::from("Marie"),
            last_name: String::from("Curie"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn nobody_is_known() {
        let db = create_database().await;
        let txn = db.begin().await.unwrap();
        let directory = Directory::new();

        let resolved = resolve(&directory, &txn, &sale(marie())).await.unwrap();

        assert_eq!(resolved, Resolved::default());
        assert!(!resolved.is_renewal());
    }

    #[tokio::test]
    async fn known_household() {
        let db = create_database().await;
        let txn = db.begin().await.unwrap();
        let directory = Directory::new();

        let begin = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();

        let pierre = directory.create_locked(&txn, "pc@ex.org").await.unwrap();
        directory
            .create_member(&txn, pierre.id, role::MEMBER, begin, end)
            .await
            .unwrap();

        let marie_user = directory.create_locked(&txn, "marie.curie").await.unwrap();
        directory
            .create_member(&txn, marie_user.id, role::MEMBER, begin, end)
            .await
            .unwrap();
        directory
            .set_value(&txn, fields::FIRST_NAME, marie_user.id, &String::from("Marie"))
            .await
            .unwrap();
        directory
            .set_value(&txn, fields::LAST_NAME, marie_user.id, &String::from("Curie"))
            .await
            .unwrap();

        let resolved = resolve(&directory, &txn, &sale(marie())).await.unwrap();

        assert_eq!(
            resolved,
            Resolved {
                primary: pierre.id,
                associate: marie_user.id
            }
        );
        assert!(resolved.is_renewal());
    }

    #[tokio::test]
    async fn shared_email_matches_associate_by_names() {
        let db = create_database().await;
        let txn = db.begin().await.unwrap();
        let directory = Directory::new();

        let begin = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();

        let pierre = directory.create_locked(&txn, "pc@ex.org").await.unwrap();
        directory
            .create_member(&txn, pierre.id, role::MEMBER, begin, end)
            .await
            .unwrap();

        let marie = SaleMember {
            email: String::from("PC@ex.org"),
            ..marie()
        };

        let resolved = resolve(&directory, &txn, &sale(marie)).await.unwrap();

        assert_eq!(
            resolved,
            Resolved {
                primary: pierre.id,
                associate: 0
            }
        );
    }

    #[tokio::test]
    async fn absent_associate_is_not_looked_up() {
        let db = create_database().await;
        let txn = db.begin().await.unwrap();
        let directory = Directory::new();

        let resolved = resolve(&directory, &txn, &sale(SaleMember::default()))
            .await
            .unwrap();

        assert_eq!(resolved.associate, 0);
    }
}
