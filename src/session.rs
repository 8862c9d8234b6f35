//! Access view state.
//!
//! [`AccessSession`] drives one visitor through the access page: verify,
//! browse, delete with confirmation, log out. Each operation takes
//! `&mut self`, so a session can only have one call in flight.

use crate::file::{FileEntry, PortalService, VerifiedUser};
use crate::{PortalError, Result};

/// Category of a failed verification, used to pick the message style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Auth,
    Permission,
    Backend,
    Internal,
}

impl From<&PortalError> for ErrorKind {
    fn from(e: &PortalError) -> Self {
        match e {
            PortalError::Validation(_) => ErrorKind::Validation,
            PortalError::NotFound(_) => ErrorKind::NotFound,
            PortalError::Auth(_) => ErrorKind::Auth,
            PortalError::Permission(_) => ErrorKind::Permission,
            PortalError::Backend(_) => ErrorKind::Backend,
            PortalError::Io(_) | PortalError::Config(_) => ErrorKind::Internal,
        }
    }
}

/// What the access view currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessView {
    /// Credential form, nothing loaded.
    Unverified,
    /// Verification in progress.
    Verifying { user_name: String },
    /// Listing of the verified user's files.
    Verified {
        user: VerifiedUser,
        files: Vec<FileEntry>,
        /// Key awaiting delete confirmation.
        pending_delete: Option<String>,
    },
    /// Verification failed.
    Error { kind: ErrorKind, message: String },
}

/// One visitor's access view.
#[derive(Debug)]
pub struct AccessSession {
    service: PortalService,
    view: AccessView,
}

impl AccessSession {
    /// Create a session in the `Unverified` state.
    pub fn new(service: PortalService) -> Self {
        Self {
            service,
            view: AccessView::Unverified,
        }
    }

    /// Current view.
    pub fn view(&self) -> &AccessView {
        &self.view
    }

    /// Verified user, if any.
    pub fn user(&self) -> Option<&VerifiedUser> {
        match &self.view {
            AccessView::Verified { user, .. } => Some(user),
            _ => None,
        }
    }

    /// Current listing, empty unless verified.
    pub fn files(&self) -> &[FileEntry] {
        match &self.view {
            AccessView::Verified { files, .. } => files,
            _ => &[],
        }
    }

    /// Verify credentials and load the listing.
    ///
    /// Any previous state is replaced. On failure the view becomes
    /// [`AccessView::Error`] and the error is returned as well.
    pub async fn verify(&mut self, user_name: &str, password: &str) -> Result<()> {
        self.view = AccessView::Verifying {
            user_name: user_name.to_string(),
        };

        let loaded = async {
            let user = self.service.verify(user_name, password).await?;
            let files = self.service.list_files(&user).await?;
            Ok::<_, PortalError>((user, files))
        }
        .await;

        match loaded {
            Ok((user, files)) => {
                self.view = AccessView::Verified {
                    user,
                    files,
                    pending_delete: None,
                };
                Ok(())
            }
            Err(e) => {
                self.view = AccessView::Error {
                    kind: ErrorKind::from(&e),
                    message: e.user_message(),
                };
                Err(e)
            }
        }
    }

    /// Ask for confirmation before deleting `file_key`.
    pub fn request_delete(&mut self, file_key: &str) -> Result<()> {
        match &mut self.view {
            AccessView::Verified {
                files,
                pending_delete,
                ..
            } => {
                if !files.iter().any(|f| f.key == file_key) {
                    return Err(PortalError::Validation(format!(
                        "file is not in the current listing: {file_key}"
                    )));
                }
                *pending_delete = Some(file_key.to_string());
                Ok(())
            }
            _ => Err(not_verified()),
        }
    }

    /// Drop a pending delete.
    pub fn cancel_delete(&mut self) {
        if let AccessView::Verified { pending_delete, .. } = &mut self.view {
            *pending_delete = None;
        }
    }

    /// Delete the file awaiting confirmation.
    ///
    /// The entry leaves the listing only after the backend confirmed the
    /// delete. On failure the listing is kept unchanged.
    pub async fn confirm_delete(&mut self) -> Result<()> {
        let AccessView::Verified {
            user,
            files,
            pending_delete,
        } = &mut self.view
        else {
            return Err(not_verified());
        };
        let Some(file_key) = pending_delete.take() else {
            return Err(PortalError::Validation(
                "no deletion awaiting confirmation".to_string(),
            ));
        };

        self.service.delete_file(user, &file_key).await?;
        files.retain(|f| f.key != file_key);
        Ok(())
    }

    /// Reload the listing.
    pub async fn refresh(&mut self) -> Result<()> {
        let AccessView::Verified { user, files, .. } = &mut self.view else {
            return Err(not_verified());
        };
        *files = self.service.list_files(user).await?;
        Ok(())
    }

    /// Forget the verified user and the listing.
    pub fn logout(&mut self) {
        self.view = AccessView::Unverified;
    }
}

fn not_verified() -> PortalError {
    PortalError::Auth("verify your name and password first".to_string())
}
