
#[cfg(test)]
mod mentorship_request_tests;
#[cfg(test)]
mod mentorship_tests;
#[cfg(test)]
mod meeting_tests;
#[cfg(test)]
mod ws_tests;
