use crate::dtos::auth::RegisterRequest;
use crate::services::ServiceError;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const EMAIL_MAX: usize = 255;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;

/// Field rules for account creation.
pub struct PolicyService;

impl PolicyService {
    /// Checks run in a fixed order and stop at the first violation:
    /// username, then email, then password, then confirmation.
    pub fn validate_registration(req: &RegisterRequest) -> Result<(), ServiceError> {
        Self::validate_username(&req.username)?;
        Self::validate_email(&req.email)?;
        Self::validate_password(&req.password)?;
        Self::validate_confirmation(&req.password, &req.confirm_password)?;
        Ok(())
    }

    fn validate_username(username: &str) -> Result<(), ServiceError> {
        if username.len() < USERNAME_MIN || username.len() > USERNAME_MAX {
            return Err(ServiceError::Validation {
                field: "username",
                message: format!(
                    "Username must be between {} and {} characters",
                    USERNAME_MIN, USERNAME_MAX
                ),
            });
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ServiceError::Validation {
                field: "username",
                message: "Username may only contain letters, numbers, and underscores"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn validate_email(email: &str) -> Result<(), ServiceError> {
        if email.is_empty() || email.len() > EMAIL_MAX {
            return Err(ServiceError::Validation {
                field: "email",
                message: format!("Email must be between 1 and {} characters", EMAIL_MAX),
            });
        }

        // local@domain.tld shape; full RFC parsing is out of scope.
        let well_formed = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !email.contains(char::is_whitespace)
                    && !domain.contains('@')
            }
            None => false,
        };

        if !well_formed {
            return Err(ServiceError::Validation {
                field: "email",
                message: "Email address is not valid".to_string(),
            });
        }
        Ok(())
    }

    fn validate_password(password: &str) -> Result<(), ServiceError> {
        if password.len() < PASSWORD_MIN {
            return Err(ServiceError::Validation {
                field: "password",
                message: format!("Password must be at least {} characters", PASSWORD_MIN),
            });
        }
        if password.len() > PASSWORD_MAX {
            return Err(ServiceError::Validation {
                field: "password",
                message: format!("Password must be at most {} characters", PASSWORD_MAX),
            });
        }
        Ok(())
    }

    fn validate_confirmation(password: &str, confirm: &str) -> Result<(), ServiceError> {
        if password != confirm {
            return Err(ServiceError::Validation {
                field: "confirmPassword",
                message: "Password confirmation does not match".to_string(),
            });
        }
        Ok(())
    }
}
