// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! HTTP client for the hosted backend.
//!
//! The backend exposes its tables through a PostgREST-style API under
//! `/rest/v1`. Requests are blocking and made from whichever worker thread
//! needs them.

use std::time::Duration;

use reqwest::{
    StatusCode,
    blocking::{Client, RequestBuilder, Response},
};
use serde::Serialize;

use crate::{
    model::Song,
    remote::{LikedRow, RemoteBackend, RemoteError, SongRow},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct RestBackend {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

#[derive(Serialize)]
struct ListenRow<'a> {
    user_id: &'a str,
    song_id: &'a str,
}

#[derive(Serialize)]
struct IncrementPlays<'a> {
    song_id: &'a str,
}

impl RestBackend {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        access_token: Option<String>,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token,
        })
    }

    fn table_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        request
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    fn check(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(RemoteError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            })
        }
    }
}

impl RemoteBackend for RestBackend {
    fn fetch_uploads(&self, user_id: &str) -> Result<Vec<Song>, RemoteError> {
        let url = self.table_url("songs");
        let user_filter = format!("eq.{user_id}");
        let request = self.client.get(&url).query(&[
            ("select", "*"),
            ("user_id", user_filter.as_str()),
            ("order", "created_at.desc"),
        ]);

        let rows: Vec<SongRow> = Self::check(self.authorize(request).send()?)?.json()?;

        Ok(rows.into_iter().map(Song::from).collect())
    }

    fn fetch_liked(&self, user_id: &str) -> Result<Vec<Song>, RemoteError> {
        let url = self.table_url("likes");
        let user_filter = format!("eq.{user_id}");
        let request = self.client.get(&url).query(&[
            ("select", "songs(*)"),
            ("user_id", user_filter.as_str()),
            ("order", "created_at.desc"),
        ]);

        let rows: Vec<LikedRow> = Self::check(self.authorize(request).send()?)?.json()?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.songs)
            .map(Song::from)
            .collect())
    }

    fn record_listen(&self, user_id: &str, song_id: &str) -> Result<(), RemoteError> {
        let request = self
            .client
            .post(self.table_url("listening_history"))
            .header("Prefer", "return=minimal")
            .json(&ListenRow { user_id, song_id });

        Self::check(self.authorize(request).send()?)?;

        Ok(())
    }

    fn increment_plays(&self, song_id: &str) -> Result<(), RemoteError> {
        let request = self
            .client
            .post(self.table_url("rpc/increment_plays"))
            .json(&IncrementPlays { song_id });

        let response = self.authorize(request).send()?;
        // The function returns void, which PostgREST reports as 204.
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }
        Self::check(response)?;

        Ok(())
    }

    fn fetch_audio(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        let response = Self::check(self.client.get(url).send()?)?;

        Ok(response.bytes()?.to_vec())
    }
}
