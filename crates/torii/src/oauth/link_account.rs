// Account linking — resolve an external identity to a local user.
//
// Three outcomes, checked in order:
//   1. (provider, providerAccountId) already linked → that user, unchanged.
//   2. A user exists with the profile's email → link a new account to it.
//      Email is the cross-provider merge key by design.
//   3. Neither → create user + account in one atomic store operation.

use torii_core::db::store::{AuthStore, NewAccount, NewUser, StoreError};
use torii_core::User;
use torii_oauth2::UserProfile;

pub async fn resolve_user(
    store: &dyn AuthStore,
    provider: &str,
    profile: &UserProfile,
) -> Result<User, StoreError> {
    let email = profile.email.to_lowercase();

    if let Some(account) = store
        .find_account(provider, &profile.provider_account_id)
        .await?
    {
        // Known identity: refresh only the cached provider display name.
        // Drifted profile fields are never silently written to the user.
        store
            .update_account_name(provider, &profile.provider_account_id, Some(&profile.name))
            .await?;
        return store
            .find_user_by_id(&account.user_id)
            .await?
            .ok_or(StoreError::NotFound);
    }

    let new_account = NewAccount {
        provider: provider.to_string(),
        provider_account_id: profile.provider_account_id.clone(),
        provider_account_name: Some(profile.name.clone()),
    };

    if let Some(user) = store.find_user_by_email(&email).await? {
        match store.create_account(&user.id, new_account).await {
            Ok(_) | Err(StoreError::Duplicate(_)) => return Ok(user),
            Err(e) => return Err(e),
        }
    }

    let new_user = NewUser {
        name: profile.name.clone(),
        email: email.clone(),
        password: None,
        image: profile.image.clone(),
    };

    match store.create_user_with_account(new_user, new_account).await {
        Ok(user) => Ok(user),
        // Lost a race with an identical registration: the uniqueness
        // constraint on (provider, providerAccountId) or email fired.
        // Whoever won holds the rows now; read them back.
        Err(StoreError::Duplicate(_)) => {
            if let Some(account) = store
                .find_account(provider, &profile.provider_account_id)
                .await?
            {
                return store
                    .find_user_by_id(&account.user_id)
                    .await?
                    .ok_or(StoreError::NotFound);
            }
            store
                .find_user_by_email(&email)
                .await?
                .ok_or(StoreError::NotFound)
        }
        Err(e) => Err(e),
    }
}
