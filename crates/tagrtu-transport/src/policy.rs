use tagrtu_message::{Framable, Result};

/// Decides what happens to a response once it has been read.
pub trait ResponsePolicy: Send {
    /// Whether `response` should be discarded and another one read.
    fn should_retry(&self, request: &dyn Framable, response: &dyn Framable) -> bool;

    /// Check `response` against `request`.
    fn validate(&self, request: &dyn Framable, response: &dyn Framable) -> Result<()>;
}

/// Policy for links whose reads always return a complete frame.
///
/// Reads only finish at a trailer or after the fixed byte count, so a
/// response is never retried. Validation is left to the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailerFramedPolicy;

impl ResponsePolicy for TrailerFramedPolicy {
    fn should_retry(&self, _request: &dyn Framable, _response: &dyn Framable) -> bool {
        false
    }

    fn validate(&self, request: &dyn Framable, response: &dyn Framable) -> Result<()> {
        match request.as_validatable() {
            Some(request) => request.validate_response(response),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use tagrtu_message::{
        ByteCollection, FromFrame, MessageError, ReadCustomRequest, ReadCustomResponse,
        Validatable,
    };

    use super::*;

    struct Plain;

    impl Framable for Plain {
        fn function_code(&self) -> u8 {
            3
        }

        fn slave_address(&self) -> u8 {
            1
        }

        fn protocol_data_unit(&self) -> Bytes {
            Bytes::from_static(&[0x03])
        }
    }

    struct Picky;

    impl Framable for Picky {
        fn function_code(&self) -> u8 {
            3
        }

        fn slave_address(&self) -> u8 {
            1
        }

        fn protocol_data_unit(&self) -> Bytes {
            Bytes::from_static(&[0x03])
        }

        fn as_validatable(&self) -> Option<&dyn Validatable> {
            Some(self)
        }
    }

    impl Validatable for Picky {
        fn validate_response(&self, response: &dyn Framable) -> Result<()> {
            if response.function_code() != self.function_code() {
                return Err(MessageError::Validation(format!(
                    "expected function code {}, got {}",
                    self.function_code(),
                    response.function_code()
                )));
            }
            Ok(())
        }
    }

    fn response() -> ReadCustomResponse {
        ReadCustomResponse::from_frame(&[0x00, 0x01, 0x02]).unwrap()
    }

    #[test]
    fn never_retries() {
        let request = ReadCustomRequest::new(ByteCollection::new(vec![0x01u8]));
        assert!(!TrailerFramedPolicy.should_retry(&request, &response()));
    }

    #[test]
    fn non_validatable_request_accepts_anything() {
        TrailerFramedPolicy.validate(&Plain, &response()).unwrap();
    }

    #[test]
    fn validatable_request_decides() {
        let err = TrailerFramedPolicy.validate(&Picky, &response()).unwrap_err();
        assert!(matches!(err, MessageError::Validation(_)));

        TrailerFramedPolicy.validate(&Picky, &Plain).unwrap();
    }
}
