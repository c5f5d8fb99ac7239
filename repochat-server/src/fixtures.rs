//! Built-in sample files served when a repository has no ingested snapshot.
//!
//! They back the canned chat citations so the viewer always has something to show.

const JWT_TS: &str = r#"import jwt from 'jsonwebtoken'

export function verifyToken(token: string) {
  if (!token) {
    throw new Error('missing token')
  }

  const decoded = jwt.verify(token, process.env.JWT_SECRET!)
  return decoded
}

export function signToken(payload: object) {
  return jwt.sign(payload, process.env.JWT_SECRET!, { expiresIn: '1h' })
}
"#;

const FIXTURE_FILES: &[(&str, &str)] = &[("src/auth/jwt.ts", JWT_TS)];

/// Content of the built-in file at `path`
pub fn fixture_file(path: &str) -> Option<&'static str> {
    FIXTURE_FILES
        .iter()
        .find(|(p, _)| *p == path)
        .map(|(_, content)| *content)
}
