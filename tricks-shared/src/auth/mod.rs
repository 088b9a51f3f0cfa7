/// Authentication and authorization
///
/// - [`password`]: Argon2id hashing for stored credentials
/// - [`jwt`]: access and refresh tokens
/// - [`middleware`]: turns a Bearer header into an [`middleware::AuthContext`]
/// - [`authorization`]: trick ownership checks
///
/// # Example
///
/// ```no_run
/// use tricks_shared::auth::jwt::{create_token, Claims, TokenType};
/// use tricks_shared::auth::password::{hash_password, verify_password};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Tr1cks&Treats")?;
/// assert!(verify_password("Tr1cks&Treats", &hash)?);
///
/// let token = create_token(&Claims::new(Uuid::new_v4(), TokenType::Access), "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
